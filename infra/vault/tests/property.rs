use fieldguard_vault::{FieldCodec, SecretKey, VaultError};
use proptest::prelude::*;

fn codec(seed: u8) -> FieldCodec {
    FieldCodec::new(&SecretKey::from_bytes([seed; 32])).unwrap()
}

fn flip_hex(s: &str, index: usize) -> String {
    let mut chars: Vec<char> = s.chars().collect();
    let i = index % chars.len();
    chars[i] = if chars[i] == '0' { '1' } else { '0' };
    chars.into_iter().collect()
}

/// Uppercases one of the hex letters in `s`, or `None` if it has only digits.
fn upcase_letter(s: &str, index: usize) -> Option<String> {
    let letters: Vec<usize> = s.char_indices().filter(|(_, c)| c.is_ascii_alphabetic()).map(|(i, _)| i).collect();
    let at = *letters.get(index % letters.len().max(1))?;
    let mut out = s.to_owned();
    out.replace_range(at..=at, &s[at..=at].to_uppercase());
    Some(out)
}

proptest! {
    #[test]
    fn roundtrip_arbitrary_text(value in ".{0,256}") {
        let codec = codec(1);
        let envelope = codec.seal(&value).unwrap();
        prop_assert_eq!(envelope.data.len(), value.len() * 2);
        prop_assert_eq!(codec.open(&envelope).unwrap(), value);
    }

    #[test]
    fn tampered_data_fails_authentication(value in ".{1,64}", index in any::<usize>()) {
        let codec = codec(2);
        let mut envelope = codec.seal(&value).unwrap();
        envelope.data = flip_hex(&envelope.data, index);
        prop_assert!(matches!(codec.open(&envelope), Err(VaultError::Decryption { .. })), "expected VaultError::Decryption");
    }

    #[test]
    fn tampered_tag_fails_authentication(value in ".{0,64}", index in any::<usize>()) {
        let codec = codec(3);
        let mut envelope = codec.seal(&value).unwrap();
        envelope.tag = flip_hex(&envelope.tag, index);
        prop_assert!(matches!(codec.open(&envelope), Err(VaultError::Decryption { .. })), "expected VaultError::Decryption");
    }

    #[test]
    fn wrong_key_fails_authentication(value in ".{0,64}") {
        let envelope = codec(4).seal(&value).unwrap();
        prop_assert!(matches!(codec(5).open(&envelope), Err(VaultError::Decryption { .. })), "expected VaultError::Decryption");
    }

    #[test]
    fn case_flipped_tag_or_data_fails(value in ".{1,64}", in_tag in any::<bool>(), index in any::<usize>()) {
        let codec = codec(6);
        let mut envelope = codec.seal(&value).unwrap();
        let part = if in_tag { &mut envelope.tag } else { &mut envelope.data };
        let altered = upcase_letter(part, index);
        prop_assume!(altered.is_some());
        *part = altered.unwrap();
        prop_assert!(matches!(codec.open(&envelope), Err(VaultError::Decryption { .. })), "expected VaultError::Decryption");
    }
}
