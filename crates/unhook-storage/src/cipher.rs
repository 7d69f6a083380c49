//! Record cipher.
//!
//! Records are the UTF-8 bytes XOR-ed with the repeating device key, base64
//! encoded (standard alphabet) and tagged with [`ENCRYPTED_PREFIX`]. This is
//! obfuscation at rest, not authenticated encryption.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;

use crate::errors::CipherError;

/// Tag marking a stored value as an encrypted record.
pub const ENCRYPTED_PREFIX: &str = "enc_v1:";

/// Length of generated device keys in bytes.
pub const KEY_LEN: usize = 32;

/// Constant key used when the secret store is unavailable.
pub const FALLBACK_KEY: &[u8; KEY_LEN] = b"unhook-local-fallback-key-v1-32b";

/// Generate a random 256-bit key.
pub fn generate_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    rand::rng().fill_bytes(&mut key);
    key
}

/// Base64 form of a key, as kept in the secret store.
pub fn encode_key(key: &[u8]) -> String {
    STANDARD.encode(key)
}

/// Parse a stored key. Anything but a non-empty base64 payload is rejected.
pub fn decode_key(encoded: &str) -> Result<Vec<u8>, CipherError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| CipherError::InvalidEncoding)?;
    if bytes.is_empty() {
        return Err(CipherError::EmptyKey);
    }
    Ok(bytes)
}

/// XOR `data` in place with the repeating `key`.
fn xor_in_place(data: &mut [u8], key: &[u8]) {
    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

/// Encrypt `plaintext` into a prefixed record.
pub fn encrypt(plaintext: &str, key: &[u8]) -> Result<String, CipherError> {
    if key.is_empty() {
        return Err(CipherError::EmptyKey);
    }
    let mut bytes = plaintext.as_bytes().to_vec();
    xor_in_place(&mut bytes, key);
    Ok(format!("{ENCRYPTED_PREFIX}{}", STANDARD.encode(&bytes)))
}

/// Decrypt a prefixed record.
pub fn decrypt(record: &str, key: &[u8]) -> Result<String, CipherError> {
    if key.is_empty() {
        return Err(CipherError::EmptyKey);
    }
    let payload = record
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or(CipherError::MissingPrefix)?;
    let mut bytes = STANDARD
        .decode(payload)
        .map_err(|_| CipherError::InvalidEncoding)?;
    xor_in_place(&mut bytes, key);
    String::from_utf8(bytes).map_err(|_| CipherError::InvalidUtf8)
}

/// Whether `value` carries the encryption prefix.
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_device_key() {
        let key = generate_key();
        let value = "Günaydın, 7. gün 🎉";
        let record = encrypt(value, &key).unwrap();
        assert!(is_encrypted(&record));
        assert_eq!(decrypt(&record, &key).unwrap(), value);
    }

    #[test]
    fn ciphertext_hides_plaintext() {
        let key = generate_key();
        let record = encrypt("currentStreak", &key).unwrap();
        assert!(!record.contains("currentStreak"));
    }

    #[test]
    fn short_key_repeats() {
        let record = encrypt("abcd", b"k").unwrap();
        assert_eq!(decrypt(&record, b"k").unwrap(), "abcd");
    }

    #[test]
    fn decrypt_requires_prefix() {
        assert_eq!(decrypt("plain", FALLBACK_KEY), Err(CipherError::MissingPrefix));
    }

    #[test]
    fn decrypt_rejects_bad_base64() {
        assert_eq!(
            decrypt("enc_v1:!!not base64!!", FALLBACK_KEY),
            Err(CipherError::InvalidEncoding)
        );
    }

    #[test]
    fn wrong_key_is_detectable_or_garbled() {
        let record = encrypt("hello world", &generate_key()).unwrap();
        let result = decrypt(&record, &generate_key());
        assert_ne!(result, Ok("hello world".to_string()));
    }

    #[test]
    fn empty_key_rejected() {
        assert_eq!(encrypt("x", &[]), Err(CipherError::EmptyKey));
        assert_eq!(decrypt("enc_v1:", &[]), Err(CipherError::EmptyKey));
    }

    #[test]
    fn key_encoding() {
        let key = generate_key();
        let encoded = encode_key(&key);
        assert_eq!(decode_key(&encoded).unwrap(), key.to_vec());
        assert_eq!(decode_key(""), Err(CipherError::EmptyKey));
        assert_eq!(decode_key("%%%"), Err(CipherError::InvalidEncoding));
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(generate_key(), generate_key());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip_any_string(
                value in any::<String>(),
                key in proptest::collection::vec(any::<u8>(), 1..64),
            ) {
                let record = encrypt(&value, &key).unwrap();
                prop_assert!(is_encrypted(&record));
                prop_assert_eq!(decrypt(&record, &key).unwrap(), value);
            }

            #[test]
            fn key_encoding_roundtrip(key in proptest::collection::vec(any::<u8>(), 1..64)) {
                prop_assert_eq!(decode_key(&encode_key(&key)).unwrap(), key);
            }
        }
    }
}
