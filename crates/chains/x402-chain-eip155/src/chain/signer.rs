//! Signers used by the EVM and TRON mechanisms.

use alloy_primitives::{Address, B256, Signature};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use x402_tron_types::scheme::X402Error;

#[cfg(feature = "telemetry")]
use tracing::{instrument, warn};

/// Anything that can sign a 32-byte prehash with a secp256k1 key.
///
/// Alloy's `Signer` is not implemented for `Arc<T>`, which is how signers get
/// shared between mechanisms, hence this indirection.
#[async_trait]
pub trait SignerLike: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error>;
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

#[async_trait]
impl<T: SignerLike + ?Sized> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }
}

/// A signer that signs one hash at a time and gives up after a timeout.
///
/// Clones share the same lock, so every mechanism built from clones of one
/// `SerialSigner` is serialized against the others. The timeout covers
/// waiting for the lock as well as the signature itself.
pub struct SerialSigner<S> {
    inner: Arc<S>,
    lock: Arc<Mutex<()>>,
    timeout: Duration,
}

impl<S> Clone for SerialSigner<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            lock: self.lock.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S> std::fmt::Debug for SerialSigner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSigner")
            .field("signer", &std::any::type_name::<S>())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<S: SignerLike> SerialSigner<S> {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(signer: S) -> Self {
        Self {
            inner: Arc::new(signer),
            lock: Arc::new(Mutex::new(())),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// Holds the signer lock until the guard is dropped.
    #[cfg(test)]
    pub(crate) async fn hold_lock(&self) -> tokio::sync::OwnedMutexGuard<()> {
        self.lock.clone().lock_owned().await
    }

    pub async fn sign(&self, hash: &B256) -> Result<Signature, X402Error> {
        let hash = *hash;
        let ((), signature) = self.sign_with(|_| ((), hash)).await?;
        Ok(signature)
    }

    /// Runs `prepare` and signs the hash it returns, both under the signer lock.
    ///
    /// `prepare` receives the signer address and returns the message alongside
    /// its hash. Nonces and deadlines generated inside it are fresh as of the
    /// moment the lock was acquired.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.sign", skip_all, fields(signer = %self.inner.address()), err))]
    pub async fn sign_with<T, F>(&self, prepare: F) -> Result<(T, Signature), X402Error>
    where
        T: Send,
        F: FnOnce(Address) -> (T, B256) + Send,
    {
        let signing = async {
            let _guard = self.lock.lock().await;
            let (message, hash) = prepare(self.inner.address());
            let signature = self.inner.sign_hash(&hash).await?;
            Ok::<_, alloy_signer::Error>((message, signature))
        };
        match tokio::time::timeout(self.timeout, signing).await {
            Ok(Ok(signed)) => Ok(signed),
            Ok(Err(e)) => Err(X402Error::SigningFailed(e.to_string())),
            Err(_) => {
                #[cfg(feature = "telemetry")]
                warn!(timeout = ?self.timeout, "Signer timed out");
                Err(X402Error::SigningFailed(format!(
                    "signer did not answer within {:?}",
                    self.timeout
                )))
            }
        }
    }
}
