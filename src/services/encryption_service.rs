use aes::Aes256;
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use thiserror::Error;

const NONCE_SIZE: usize = 12; // AES-GCM standard nonce size
const LEGACY_IV_SIZE: usize = 16;

type LegacyDecryptor = cfb_mode::Decryptor<Aes256>;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Invalid hex key: {0}")]
    InvalidKey(String),
    #[error("Encryption key must be 32 bytes (256 bits) long")]
    InvalidKeyLength,
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Decrypts stored device secrets. Polling only ever needs this half of the credential store.
pub trait CredentialDecryptor: Send + Sync {
    fn decrypt_secret(&self, stored: &str) -> Result<String, EncryptionError>;
}

/// AES-256-GCM for device passwords at rest.
/// The stored form is hex of a 12-byte nonce followed by the ciphertext.
///
/// Rows written by the inventory backend use base64 of a 16-byte IV followed by AES-256-CFB
/// ciphertext under a raw 32-character key. Those are readable once a legacy key is set.
pub struct EncryptionService {
    cipher: Aes256Gcm,
    legacy_key: Option<[u8; 32]>,
}

impl EncryptionService {
    pub fn new(key: &[u8]) -> Result<Self, EncryptionError> {
        Ok(Self {
            cipher: Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::InvalidKeyLength)?,
            legacy_key: None,
        })
    }

    /// Enables reading the inventory backend's CFB format. `key` is used as raw bytes.
    pub fn with_legacy_key(mut self, key: &str) -> Result<Self, EncryptionError> {
        let key: [u8; 32] = key
            .as_bytes()
            .try_into()
            .map_err(|_| EncryptionError::InvalidKeyLength)?;
        self.legacy_key = Some(key);
        Ok(self)
    }

    /// Builds the service from the 64-character hex key held in the configuration.
    pub fn from_hex(key_hex: &str) -> Result<Self, EncryptionError> {
        let key_bytes =
            hex::decode(key_hex.trim()).map_err(|e| EncryptionError::InvalidKey(e.to_string()))?;
        if key_bytes.len() != 32 {
            return Err(EncryptionError::InvalidKeyLength);
        }
        Self::new(&key_bytes)
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let mut result = nonce.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    pub fn decrypt(&self, encrypted_data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        if encrypted_data.len() < NONCE_SIZE {
            return Err(EncryptionError::DecryptionFailed(
                "Ciphertext is too short to contain a nonce".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = encrypted_data.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))
    }

    pub fn encrypt_to_string(&self, plain_text: &str) -> Result<String, EncryptionError> {
        Ok(hex::encode(self.encrypt(plain_text.as_bytes())?))
    }

    pub fn decrypt_to_string(&self, cipher_hex: &str) -> Result<String, EncryptionError> {
        let encrypted = hex::decode(cipher_hex.trim()).map_err(|e| {
            EncryptionError::DecryptionFailed(format!("Invalid hex ciphertext: {e}"))
        })?;
        let decrypted = self.decrypt(&encrypted)?;
        String::from_utf8(decrypted)
            .map_err(|e| EncryptionError::DecryptionFailed(format!("Invalid UTF-8 sequence: {e}")))
    }

    pub fn decrypt_legacy(&self, cipher_b64: &str) -> Result<String, EncryptionError> {
        let key = self.legacy_key.as_ref().ok_or_else(|| {
            EncryptionError::DecryptionFailed("No legacy key configured".to_string())
        })?;
        let data = STANDARD.decode(cipher_b64.trim()).map_err(|e| {
            EncryptionError::DecryptionFailed(format!("Invalid base64 ciphertext: {e}"))
        })?;
        if data.len() < LEGACY_IV_SIZE {
            return Err(EncryptionError::DecryptionFailed(
                "Ciphertext is too short to contain an IV".to_string(),
            ));
        }

        let (iv, ciphertext) = data.split_at(LEGACY_IV_SIZE);
        let mut plaintext = ciphertext.to_vec();
        LegacyDecryptor::new_from_slices(key, iv)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?
            .decrypt(&mut plaintext);
        String::from_utf8(plaintext)
            .map_err(|e| EncryptionError::DecryptionFailed(format!("Invalid UTF-8 sequence: {e}")))
    }
}

impl CredentialDecryptor for EncryptionService {
    /// GCM first; CFB is unauthenticated.
    fn decrypt_secret(&self, stored: &str) -> Result<String, EncryptionError> {
        match self.decrypt_to_string(stored) {
            Err(_) if self.legacy_key.is_some() => self.decrypt_legacy(stored),
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn test_encrypt_decrypt_success() {
        let service = EncryptionService::from_hex(KEY_HEX).unwrap();
        let plain_text = "router-admin-password";

        let encrypted = service.encrypt_to_string(plain_text).unwrap();
        let decrypted = service.decrypt_secret(&encrypted).unwrap();

        assert_ne!(plain_text, encrypted);
        assert_eq!(plain_text, decrypted);
    }

    #[test]
    fn test_decrypt_with_wrong_key() {
        let service1 = EncryptionService::from_hex(KEY_HEX).unwrap();
        let service2 = EncryptionService::from_hex(
            "f1e1d1c1b1a191817161514131211101f0e0d0c0b0a090807060504030201000",
        )
        .unwrap();

        let encrypted = service1.encrypt_to_string("another secret").unwrap();
        let result = service2.decrypt_secret(&encrypted);

        assert!(matches!(result, Err(EncryptionError::DecryptionFailed(_))));
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(
            EncryptionService::from_hex("1234"),
            Err(EncryptionError::InvalidKeyLength)
        ));
        assert!(matches!(
            EncryptionService::from_hex(&format!("{KEY_HEX}20")),
            Err(EncryptionError::InvalidKeyLength)
        ));
    }

    const LEGACY_KEY: &str = "0123456789abcdef0123456789abcdef";

    fn legacy_ciphertext(plain_text: &str) -> String {
        type LegacyEncryptor = cfb_mode::Encryptor<Aes256>;
        let iv = [7u8; LEGACY_IV_SIZE];
        let mut data = plain_text.as_bytes().to_vec();
        LegacyEncryptor::new_from_slices(LEGACY_KEY.as_bytes(), &iv)
            .unwrap()
            .encrypt(&mut data);
        let mut stored = iv.to_vec();
        stored.extend_from_slice(&data);
        STANDARD.encode(stored)
    }

    #[test]
    fn test_legacy_cfb_secret_is_readable() {
        let service = EncryptionService::from_hex(KEY_HEX)
            .unwrap()
            .with_legacy_key(LEGACY_KEY)
            .unwrap();

        let stored = legacy_ciphertext("mikrotik-api-pass");
        assert_eq!(service.decrypt_secret(&stored).unwrap(), "mikrotik-api-pass");

        // Current-format secrets keep working alongside.
        let current = service.encrypt_to_string("router-admin-password").unwrap();
        assert_eq!(service.decrypt_secret(&current).unwrap(), "router-admin-password");
    }

    #[test]
    fn test_legacy_format_needs_legacy_key() {
        let service = EncryptionService::from_hex(KEY_HEX).unwrap();
        let err = service
            .decrypt_secret(&legacy_ciphertext("mikrotik-api-pass"))
            .unwrap_err();
        assert!(matches!(err, EncryptionError::DecryptionFailed(_)));

        assert!(matches!(
            EncryptionService::from_hex(KEY_HEX).unwrap().with_legacy_key("short"),
            Err(EncryptionError::InvalidKeyLength)
        ));
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(
            EncryptionService::from_hex("not-a-hex-string"),
            Err(EncryptionError::InvalidKey(_))
        ));

        let service = EncryptionService::from_hex(KEY_HEX).unwrap();
        let err = service.decrypt_secret("not-a-hex-cipher").unwrap_err();
        assert!(err.to_string().contains("Invalid hex ciphertext"));

        let err = service.decrypt_secret("abcd").unwrap_err();
        assert!(err.to_string().contains("too short"));
    }
}
