//! x402 version 2 wire types.
//!
//! - [`X402Version2`] - Version marker that serializes as `2`
//! - [`PaymentRequirements`] - One acceptable way to pay
//! - [`PaymentRequired`] - The 402 challenge
//! - [`PaymentPayload`] - Signed proof of intended payment
//! - [`SettleResponse`] - Settlement verdict
//! - [`ResourceInfo`] - Metadata about the paid resource

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::chain::ChainId;
use crate::timestamp::UnixTimestamp;
use crate::util::TokenAmount;

/// A JSON field that is present, including an explicit `null`.
///
/// Plain `Option<Value>` reads `null` as `None`, which would not survive an
/// encode/decode round trip of `Some(Value::Null)`. Absent fields still fall
/// back to `None` through `#[serde(default)]`.
fn present_json<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Default validity window when a requirement does not state one.
pub const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 300;

/// Version marker for x402 protocol version 2.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version2;

impl X402Version2 {
    pub const VALUE: u8 = 2;
}

impl PartialEq<u8> for X402Version2 {
    fn eq(&self, other: &u8) -> bool {
        *other == Self::VALUE
    }
}

impl From<X402Version2> for u8 {
    fn from(_: X402Version2) -> Self {
        X402Version2::VALUE
    }
}

impl Serialize for X402Version2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version2 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let num = u8::deserialize(deserializer)?;
        if num == Self::VALUE {
            Ok(X402Version2)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected version {}, got {}",
                Self::VALUE,
                num
            )))
        }
    }
}

impl Display for X402Version2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

/// Metadata about the resource being paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One acceptable way to pay, as offered by the server.
///
/// Immutable once parsed: selection and payload construction only ever read
/// it, and a [`PaymentPayload`] carries its own copy.
///
/// ```
/// use x402_tron_types::proto::PaymentRequirements;
///
/// let requirements: PaymentRequirements = serde_json::from_str(r#"{
///     "scheme": "exact_permit",
///     "network": "tron:nile",
///     "amount": "100",
///     "asset": "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf",
///     "payTo": "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E",
///     "extensions": { "name": "PaymentPermit", "version": "1" }
/// }"#).unwrap();
/// assert_eq!(requirements.max_timeout_seconds, 300);
/// assert_eq!(requirements.extra_fields().unwrap().name.as_deref(), Some("PaymentPermit"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme identifier (`exact_permit`, `exact`).
    pub scheme: String,
    /// CAIP-2 chain ID (`tron:nile`, `eip155:56`).
    pub network: ChainId,
    /// Amount in the token's smallest unit.
    pub amount: TokenAmount,
    /// Token contract address, in the chain's native format.
    pub asset: String,
    /// Recipient address, in the chain's native format.
    pub pay_to: String,
    /// Validity window of time-bounded schemes.
    #[serde(default = "default_max_timeout_seconds")]
    pub max_timeout_seconds: u64,
    /// Protocol-specific metadata: permit domain, facilitator fee.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_json",
        alias = "extensions"
    )]
    pub extra: Option<serde_json::Value>,
}

fn default_max_timeout_seconds() -> u64 {
    DEFAULT_MAX_TIMEOUT_SECONDS
}

/// Typed view over [`PaymentRequirements::extra`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsExtra {
    /// EIP-712 domain name of the permit or token contract.
    #[serde(default)]
    pub name: Option<String>,
    /// EIP-712 domain version.
    #[serde(default)]
    pub version: Option<String>,
    /// Facilitator fee taken on top of the payment.
    #[serde(default)]
    pub fee: Option<FeeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeInfo {
    pub fee_to: String,
    pub fee_amount: TokenAmount,
}

impl PaymentRequirements {
    /// Reads the known fields of `extra`. A missing `extra` yields defaults.
    pub fn extra_fields(&self) -> Result<RequirementsExtra, serde_json::Error> {
        match &self.extra {
            None | Some(serde_json::Value::Null) => Ok(RequirementsExtra::default()),
            Some(value) => serde_json::from_value(value.clone()),
        }
    }
}

/// The 402 challenge.
///
/// `accepts` is required and never empty; a challenge that omits it or lists
/// nothing fails to deserialize. Order is the server's priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PaymentRequiredWire")]
pub struct PaymentRequired {
    pub x402_version: X402Version2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,
    pub accepts: Vec<PaymentRequirements>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequiredWire {
    #[serde(default)]
    x402_version: X402Version2,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    resource: Option<ResourceInfo>,
    accepts: Vec<PaymentRequirements>,
}

impl TryFrom<PaymentRequiredWire> for PaymentRequired {
    type Error = String;

    fn try_from(wire: PaymentRequiredWire) -> Result<Self, Self::Error> {
        if wire.accepts.is_empty() {
            return Err("accepts must list at least one payment requirement".into());
        }
        Ok(PaymentRequired {
            x402_version: wire.x402_version,
            error: wire.error,
            resource: wire.resource,
            accepts: wire.accepts,
        })
    }
}

impl PaymentRequired {
    /// Networks offered by the challenge, in server order, without duplicates.
    pub fn offered_networks(&self) -> Vec<ChainId> {
        let mut networks: Vec<ChainId> = Vec::with_capacity(self.accepts.len());
        for requirements in &self.accepts {
            if !networks.contains(&requirements.network) {
                networks.push(requirements.network.clone());
            }
        }
        networks
    }
}

/// Signed proof of intended payment.
///
/// Owns a copy of the requirements it answers, so a later selection can never
/// change what was signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: X402Version2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,
    pub accepted: PaymentRequirements,
    pub payload: SignedPayload,
}

/// Chain-specific signed artifact of a [`PaymentPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayload {
    /// `0x`-prefixed 65-byte secp256k1 signature.
    pub signature: String,
    /// Payer address in the chain's native format.
    pub payer: String,
    /// Permit nonce, for time-bounded permit schemes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Permit deadline, for time-bounded permit schemes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<UnixTimestamp>,
    /// The signed message itself, as the facilitator needs it to verify.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present_json")]
    pub authorization: Option<serde_json::Value>,
}

/// Settlement verdict decoded from the `PAYMENT-RESPONSE` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleResponse {
    Success {
        payer: Option<String>,
        transaction: String,
        network: ChainId,
    },
    Error {
        reason: String,
        payer: Option<String>,
        network: ChainId,
    },
}

impl SettleResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, SettleResponse::Success { .. })
    }

    pub fn network(&self) -> &ChainId {
        match self {
            SettleResponse::Success { network, .. } => network,
            SettleResponse::Error { network, .. } => network,
        }
    }

    pub fn transaction(&self) -> Option<&str> {
        match self {
            SettleResponse::Success { transaction, .. } => Some(transaction),
            SettleResponse::Error { .. } => None,
        }
    }

    pub fn error_reason(&self) -> Option<&str> {
        match self {
            SettleResponse::Success { .. } => None,
            SettleResponse::Error { reason, .. } => Some(reason),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponseWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction: Option<String>,
    network: ChainId,
}

impl Serialize for SettleResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            SettleResponse::Success {
                payer,
                transaction,
                network,
            } => SettleResponseWire {
                success: true,
                error_reason: None,
                payer: payer.clone(),
                transaction: Some(transaction.clone()),
                network: network.clone(),
            },
            SettleResponse::Error {
                reason,
                payer,
                network,
            } => SettleResponseWire {
                success: false,
                error_reason: Some(reason.clone()),
                payer: payer.clone(),
                transaction: None,
                network: network.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SettleResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = SettleResponseWire::deserialize(deserializer)?;
        if wire.success {
            let transaction = wire
                .transaction
                .filter(|t| !t.is_empty())
                .ok_or_else(|| serde::de::Error::missing_field("transaction"))?;
            Ok(SettleResponse::Success {
                payer: wire.payer,
                transaction,
                network: wire.network,
            })
        } else {
            Ok(SettleResponse::Error {
                reason: wire
                    .error_reason
                    .unwrap_or_else(|| "unspecified".to_string()),
                payer: wire.payer,
                network: wire.network,
            })
        }
    }
}
