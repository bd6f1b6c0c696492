//! # 秘密情報の暗号化（AES-256-GCM）
//!
//! SMTP パスワードを DB に保存する前に暗号化する。
//!
//! ## 暗号文の形式
//!
//! `base64(nonce_12bytes || ciphertext || tag_16bytes)`
//!
//! ## 設計方針
//!
//! - **マスターキーは環境変数から**: `SECRET_KEY_BASE64`（base64 の 32 バイト）
//! - **ドロップ時にゼロ化**: マスターキーはメモリから消去される
//! - **ランダム nonce**: 暗号化のたびに新しい 12 バイト nonce を生成する。
//!   同じ平文でも暗号文は毎回異なる

use aes_gcm::{Aes256Gcm, KeyInit, Nonce, aead::Aead};
use base64::Engine;
use zeroize::Zeroize;

use crate::error::InfraError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// 秘密情報の暗号化・復号を行うマスターキー
///
/// 32 バイト鍵による AES-256-GCM。ドロップ時に鍵をゼロ化する。
#[derive(Clone)]
pub struct SecretCipher {
    key: [u8; KEY_LEN],
}

impl Drop for SecretCipher {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl SecretCipher {
    /// base64 エンコードされた 32 バイト鍵から作成する
    pub fn from_base64(b64: &str) -> Result<Self, InfraError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|_| InfraError::crypto("マスターキーの base64 が不正"))?;
        if bytes.len() != KEY_LEN {
            return Err(InfraError::crypto(format!(
                "マスターキーの長さが不正: {} バイト（{KEY_LEN} バイト必要）",
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    /// ランダムな鍵を生成する（テスト・鍵ローテーション用）
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut key);
        Self { key }
    }

    /// 平文文字列を暗号化し `base64(nonce || ciphertext || tag)` を返す
    pub fn encrypt_string(&self, plaintext: &str) -> Result<String, InfraError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| InfraError::crypto("鍵の初期化に失敗"))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| InfraError::crypto("暗号化に失敗"))?;

        // nonce || ciphertext（tag を含む）
        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(&result))
    }

    /// `base64(nonce || ciphertext || tag)` を復号し平文文字列を返す
    pub fn decrypt_string(&self, encrypted_b64: &str) -> Result<String, InfraError> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encrypted_b64)
            .map_err(|_| InfraError::crypto("暗号文の base64 が不正"))?;

        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(InfraError::crypto("暗号文が短すぎる"));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| InfraError::crypto("鍵の初期化に失敗"))?;
        let nonce = Nonce::from_slice(&data[..NONCE_LEN]);

        let plaintext = cipher
            .decrypt(nonce, &data[NONCE_LEN..])
            .map_err(|_| InfraError::crypto("復号に失敗（鍵の不一致または改竄）"))?;

        String::from_utf8(plaintext).map_err(|_| InfraError::crypto("復号結果が UTF-8 でない"))
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_暗号化して復号すると元の平文に戻る() {
        let cipher = SecretCipher::generate();
        let encrypted = cipher.encrypt_string("smtp-password").unwrap();
        let decrypted = cipher.decrypt_string(&encrypted).unwrap();
        assert_eq!(decrypted, "smtp-password");
    }

    #[test]
    fn test_暗号文に平文が含まれない() {
        let cipher = SecretCipher::generate();
        let encrypted = cipher.encrypt_string("super-secret").unwrap();
        assert!(!encrypted.contains("super-secret"));
    }

    #[test]
    fn test_同じ平文でも暗号文は毎回異なる() {
        let cipher = SecretCipher::generate();
        let a = cipher.encrypt_string("password").unwrap();
        let b = cipher.encrypt_string("password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_別の鍵では復号できない() {
        let encrypted = SecretCipher::generate().encrypt_string("password").unwrap();
        let other = SecretCipher::generate();
        assert!(other.decrypt_string(&encrypted).is_err());
    }

    #[test]
    fn test_改竄された暗号文は復号に失敗する() {
        let cipher = SecretCipher::generate();
        let encrypted = cipher.encrypt_string("password").unwrap();

        let mut data = base64::engine::general_purpose::STANDARD
            .decode(&encrypted)
            .unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        let tampered = base64::engine::general_purpose::STANDARD.encode(&data);

        assert!(cipher.decrypt_string(&tampered).is_err());
    }

    #[test]
    fn test_base64から鍵を復元できる() {
        let key_b64 = base64::engine::general_purpose::STANDARD.encode([7u8; 32]);
        let cipher = SecretCipher::from_base64(&key_b64).unwrap();
        let cipher2 = SecretCipher::from_base64(&key_b64).unwrap();

        let encrypted = cipher.encrypt_string("password").unwrap();
        assert_eq!(cipher2.decrypt_string(&encrypted).unwrap(), "password");
    }

    #[test]
    fn test_長さ不正の鍵を拒否する() {
        let short = base64::engine::general_purpose::STANDARD.encode([0u8; 16]);
        assert!(SecretCipher::from_base64(&short).is_err());
        assert!(SecretCipher::from_base64("not-base64!!").is_err());
    }
}
