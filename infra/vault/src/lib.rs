//! Key handling and authenticated field encryption.
//!
//! Each text value is sealed with AES-256-GCM under a single 256-bit key and stored as
//! an [`Envelope`] of three lowercase hex strings:
//!
//! ```text
//! { "iv": <12 bytes>, "data": <ciphertext, len(plaintext)>, "tag": <16 bytes> }
//! ```
//!
//! ## IV Policy
//!
//! A random 96-bit IV is drawn from the system CSPRNG for every encryption. Collisions are
//! probabilistic; rotate the key long before 2^32 encryptions.
//!
//! ## Keys
//!
//! Keys come from a [`KeyProvider`]. Every provider accepts exactly 64 hex characters and
//! rejects anything else with [`VaultError::InvalidConfiguration`] and the message
//! `key must be 32-byte hex`. Key bytes are zeroized on drop and never printed.
//!
//! ## Example
//! ```rust
//! use fieldguard_vault::{FieldCodec, HexKeyProvider, KeyProvider, VaultError};
//!
//! # fn main() -> Result<(), VaultError> {
//! let provider = HexKeyProvider::new("00".repeat(32));
//! let codec = FieldCodec::new(&provider.key()?)?;
//!
//! let envelope = codec.seal("kim@x.io")?;
//! assert_eq!(codec.open(&envelope)?, "kim@x.io");
//! # Ok(())
//! # }
//! ```

mod codec;
mod envelope;
mod error;
mod key;

pub use codec::{FieldCodec, IV_LEN, TAG_LEN, decrypt_field, encrypt_field};
pub use envelope::{DATA_FIELD, Envelope, IV_FIELD, TAG_FIELD};
pub use error::{KEY_FORMAT_MESSAGE, VaultError, VaultErrorExt};
pub use key::{
    DEFAULT_KEY_ENV, EnvKeyProvider, HexKeyProvider, KEY_LEN, KeyProvider, SecretKey,
    StaticKeyProvider,
};
