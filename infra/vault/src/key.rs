use crate::error::VaultError;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Environment variable read by [`EnvKeyProvider::default`].
pub const DEFAULT_KEY_ENV: &str = "ENCRYPTION_KEY";

/// A 256-bit symmetric key, zeroized on drop.
///
/// `Debug` is redacted so the key cannot leak through logs or panics.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Decodes a 64-character hex string (either case, surrounding whitespace ignored).
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidConfiguration`] for non-hex input or any length other than
    /// 32 decoded bytes. The input is never truncated or padded.
    pub fn from_hex(encoded: &str) -> Result<Self, VaultError> {
        let mut key = Self([0u8; KEY_LEN]);
        hex::decode_to_slice(encoded.trim(), &mut key.0).map_err(|e| {
            // The decoder's own message may echo a key character; describe the failure instead.
            let reason: Cow<'static, str> = match e {
                hex::FromHexError::OddLength => "odd number of hex digits".into(),
                hex::FromHexError::InvalidStringLength => "decoded length is not 32 bytes".into(),
                hex::FromHexError::InvalidHexCharacter { index, .. } => {
                    format!("non-hex character at position {index}").into()
                },
            };
            VaultError::key_format(reason)
        })?;
        Ok(key)
    }

    /// Draws a fresh key from the system CSPRNG.
    ///
    /// # Errors
    /// Returns [`VaultError::Internal`] if the system RNG is unavailable.
    pub fn generate() -> Result<Self, VaultError> {
        let mut key = Self([0u8; KEY_LEN]);
        getrandom::fill(&mut key.0).map_err(|e| VaultError::Internal {
            message: e.to_string().into(),
            context: Some("System RNG unavailable for key generation".into()),
        })?;
        Ok(key)
    }

    /// Lowercase hex encoding, for provisioning tools and tests.
    #[must_use]
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    pub(crate) const fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time: fold over all bytes without early exit.
        self.0.iter().zip(other.0.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

impl Eq for SecretKey {}

/// Resolves the single symmetric key used for every field operation.
///
/// Implementations validate on every call; a failure must abort the calling
/// operation before any field is touched.
pub trait KeyProvider: Send + Sync {
    /// # Errors
    /// Returns [`VaultError::InvalidConfiguration`] with the message `key must be 32-byte hex`.
    fn key(&self) -> Result<SecretKey, VaultError>;
}

impl<P: KeyProvider + ?Sized> KeyProvider for Arc<P> {
    fn key(&self) -> Result<SecretKey, VaultError> {
        (**self).key()
    }
}

/// Key provider backed by a hex string from configuration.
#[derive(Clone)]
pub struct HexKeyProvider {
    encoded: Zeroizing<String>,
}

impl HexKeyProvider {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self { encoded: Zeroizing::new(encoded.into()) }
    }
}

impl KeyProvider for HexKeyProvider {
    fn key(&self) -> Result<SecretKey, VaultError> {
        SecretKey::from_hex(&self.encoded)
    }
}

impl fmt::Debug for HexKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HexKeyProvider").field("encoded", &"<redacted>").finish()
    }
}

/// Key provider reading a hex key from a process environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    var: Cow<'static, str>,
}

impl EnvKeyProvider {
    pub fn new(var: impl Into<Cow<'static, str>>) -> Self {
        Self { var: var.into() }
    }

    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvKeyProvider {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_ENV)
    }
}

impl KeyProvider for EnvKeyProvider {
    fn key(&self) -> Result<SecretKey, VaultError> {
        let encoded = Zeroizing::new(std::env::var(&*self.var).map_err(|_| {
            debug!(var = %self.var, "Encryption key variable missing or not unicode");
            VaultError::key_format(format!("{} is not set", self.var))
        })?);
        SecretKey::from_hex(&encoded)
    }
}

/// Key provider over an already decoded key.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider(SecretKey);

impl StaticKeyProvider {
    #[must_use]
    pub const fn new(key: SecretKey) -> Self {
        Self(key)
    }
}

impl KeyProvider for StaticKeyProvider {
    fn key(&self) -> Result<SecretKey, VaultError> {
        Ok(self.0.clone())
    }
}
