use crate::envelope::Envelope;
use crate::error::VaultError;
use crate::key::SecretKey;
use aead::inout::InOutBuf;
use aead::{AeadInOut, Key, KeyInit, Nonce, Tag};
use aes_gcm::Aes256Gcm;
use getrandom::fill;
use std::fmt;

/// IV length in bytes (96-bit).
pub const IV_LEN: usize = 12;

/// Authentication tag length in bytes (128-bit).
pub const TAG_LEN: usize = 16;

/// AES-256-GCM codec for single text fields.
///
/// Every [`FieldCodec::seal`] draws a fresh random IV, so sealing the same value twice
/// yields different envelopes. No associated data is bound.
#[derive(Clone)]
pub struct FieldCodec {
    cipher: Aes256Gcm,
}

impl FieldCodec {
    /// Builds a codec over `key`.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidConfiguration`] if the cipher rejects the key.
    pub fn new(key: &SecretKey) -> Result<Self, VaultError> {
        let key = Key::<Aes256Gcm>::try_from(&key.expose()[..])
            .map_err(|_| VaultError::key_format("cipher rejected key length"))?;
        Ok(Self { cipher: Aes256Gcm::new(&key) })
    }

    /// Encrypts `plaintext` into a hex envelope.
    ///
    /// # Errors
    /// Returns [`VaultError::Encryption`] if the system RNG is unavailable or the cipher fails.
    pub fn seal(&self, plaintext: &str) -> Result<Envelope, VaultError> {
        let mut nonce = Nonce::<Aes256Gcm>::default();
        fill(&mut nonce).map_err(|e| VaultError::Encryption {
            message: e.to_string().into(),
            context: Some("System RNG unavailable for IV generation".into()),
        })?;

        let mut buf = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_inout_detached(&nonce, &[], InOutBuf::from(buf.as_mut_slice()))
            .map_err(|_| VaultError::Encryption {
                message: "Encryption failed".into(),
                context: Some("AEAD encryption failed".into()),
            })?;

        Ok(Envelope {
            iv: hex::encode(nonce.as_slice()),
            data: hex::encode(&buf),
            tag: hex::encode(tag.as_slice()),
        })
    }

    /// Authenticates and decrypts an envelope back to its UTF-8 text.
    ///
    /// # Errors
    /// Returns [`VaultError::Decryption`] for parts that are not lowercase hex, a wrong IV or tag length,
    /// a failed authentication (wrong key or tampering), or a non-UTF-8 plaintext.
    pub fn open(&self, envelope: &Envelope) -> Result<String, VaultError> {
        let iv = decode_part(&envelope.iv, "IV is not lowercase hex")?;
        let tag = decode_part(&envelope.tag, "tag is not lowercase hex")?;
        let mut buf = decode_part(&envelope.data, "data is not lowercase hex")?;

        let nonce = Nonce::<Aes256Gcm>::try_from(iv.as_slice()).map_err(|_| VaultError::Decryption {
            message: format!("Invalid IV length {}, expected {IV_LEN}", iv.len()).into(),
            context: None,
        })?;
        let tag = Tag::<Aes256Gcm>::try_from(tag.as_slice()).map_err(|_| VaultError::Decryption {
            message: format!("Invalid tag length {}, expected {TAG_LEN}", tag.len()).into(),
            context: None,
        })?;

        self.cipher
            .decrypt_inout_detached(&nonce, &[], InOutBuf::from(buf.as_mut_slice()), &tag)
            .map_err(|_| VaultError::auth("AEAD authentication failed"))?;

        String::from_utf8(buf).map_err(|_| VaultError::auth("plaintext is not UTF-8"))
    }
}

/// Decodes one envelope part. [`FieldCodec::seal`] only writes lowercase, so any other
/// character, including a case change, counts as tampering.
fn decode_part(part: &str, reason: &'static str) -> Result<Vec<u8>, VaultError> {
    if part.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(VaultError::auth(reason));
    }
    hex::decode(part).map_err(|_| VaultError::auth(reason))
}

impl fmt::Debug for FieldCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCodec").field("cipher", &"Aes256Gcm").finish_non_exhaustive()
    }
}

/// Encrypts one value under `key`.
///
/// # Errors
/// See [`FieldCodec::new`] and [`FieldCodec::seal`].
pub fn encrypt_field(plaintext: &str, key: &SecretKey) -> Result<Envelope, VaultError> {
    FieldCodec::new(key)?.seal(plaintext)
}

/// Decrypts one envelope under `key`.
///
/// # Errors
/// See [`FieldCodec::new`] and [`FieldCodec::open`].
pub fn decrypt_field(envelope: &Envelope, key: &SecretKey) -> Result<String, VaultError> {
    FieldCodec::new(key)?.open(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> FieldCodec {
        FieldCodec::new(&SecretKey::from_bytes([7u8; 32])).unwrap()
    }

    #[test]
    fn envelope_has_expected_lengths() {
        let envelope = codec().seal("kim@x.io").unwrap();

        assert_eq!(envelope.iv.len(), IV_LEN * 2);
        assert_eq!(envelope.tag.len(), TAG_LEN * 2);
        assert_eq!(envelope.data.len(), "kim@x.io".len() * 2);
        assert!(envelope.iv.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn round_trips_empty_and_unicode() {
        let codec = codec();
        for value in ["", "Kim", "Zoë Łukasz 山田"] {
            assert_eq!(codec.open(&codec.seal(value).unwrap()).unwrap(), value);
        }
    }

    #[test]
    fn same_value_gets_fresh_iv() {
        let codec = codec();
        let a = codec.seal("555-0100").unwrap();
        let b = codec.seal("555-0100").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a, b);
    }

    #[test]
    fn short_iv_is_rejected() {
        let codec = codec();
        let mut envelope = codec.seal("Kim").unwrap();
        envelope.iv.truncate(22);
        assert!(matches!(codec.open(&envelope), Err(VaultError::Decryption { .. })));
    }

    #[test]
    fn non_hex_parts_are_rejected() {
        let codec = codec();
        let mut envelope = codec.seal("Kim").unwrap();
        envelope.data = "not-hex".into();
        assert!(matches!(codec.open(&envelope), Err(VaultError::Decryption { .. })));
    }

    #[test]
    fn case_changed_parts_are_rejected() {
        let codec = codec();
        let envelope = codec.seal("Kim").unwrap();

        for altered in [
            Envelope { iv: envelope.iv.to_uppercase(), ..envelope.clone() },
            Envelope { data: envelope.data.to_uppercase(), ..envelope.clone() },
            Envelope { tag: envelope.tag.to_uppercase(), ..envelope.clone() },
        ] {
            if altered != envelope {
                assert!(matches!(codec.open(&altered), Err(VaultError::Decryption { .. })));
            }
        }
    }

    #[test]
    fn free_functions_share_the_format() {
        let key = SecretKey::from_bytes([9u8; 32]);
        let envelope = encrypt_field("ext-42", &key).unwrap();
        assert_eq!(decrypt_field(&envelope, &key).unwrap(), "ext-42");
    }
}
