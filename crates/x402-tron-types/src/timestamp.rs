//! Unix timestamps for permit deadlines and authorization windows.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// Seconds since the Unix epoch.
///
/// Serialized as a stringified integer, since JavaScript numbers cannot
/// represent every 64-bit value:
///
/// ```json
/// "1699999999"
/// ```
///
/// ```
/// use x402_tron_types::timestamp::UnixTimestamp;
///
/// let deadline = UnixTimestamp::from_secs(1_700_000_000) + 300;
/// assert_eq!(deadline.as_secs(), 1_700_000_300);
/// assert_eq!(serde_json::to_string(&deadline).unwrap(), "\"1700000300\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ts = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp must be a non-negative integer"))?;
        Ok(UnixTimestamp(ts))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_add(rhs))
    }
}

impl UnixTimestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Current system time. A clock set before the epoch reads as zero.
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(now)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp moved `secs` into the past, clamped at the epoch.
    pub fn before(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}
