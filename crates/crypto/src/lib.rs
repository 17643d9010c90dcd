//! # initData 暗号処理
//!
//! initDataの署名検証に使う暗号プリミティブを提供する。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 秘密鍵導出 | HMAC-SHA256（鍵 `"WebAppData"`、メッセージ ボットトークン） |
//! | 署名 | HMAC-SHA256（鍵 秘密鍵、メッセージ チェック文字列）の小文字hex |
//! | 署名比較 | 定数時間比較 |

use hmac::{Hmac, Mac};
use serde::{Serialize, Serializer};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// 秘密鍵導出に使う固定ラベル
pub const WEB_APP_DATA_LABEL: &[u8] = b"WebAppData";

/// 署名（hex）の長さ
pub const SIGNATURE_HEX_LEN: usize = 64;

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// HMAC鍵の初期化エラー
    #[error("HMAC鍵の初期化に失敗しました")]
    InvalidKeyLength,
}

/// ボットトークンから導出した署名用秘密鍵（32バイト）。
/// ドロップ時にゼロクリアされる。
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 小文字hex表現（監査・デバッグ用。外部に公開しないこと）
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SecretKey {}

impl Serialize for SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength)?;
    mac.update(message);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    Ok(out)
}

/// ボットトークンから署名用秘密鍵を導出する。
///
/// `secret_key = HMAC-SHA256(key = "WebAppData", message = bot_token)`
pub fn derive_secret_key(bot_token: &str) -> Result<SecretKey, CryptoError> {
    hmac_sha256(WEB_APP_DATA_LABEL, bot_token.as_bytes()).map(SecretKey)
}

/// チェック文字列の署名を計算し、小文字hexで返す。
pub fn sign_check_string(secret_key: &SecretKey, check_string: &str) -> Result<String, CryptoError> {
    let mut digest = hmac_sha256(secret_key.as_bytes(), check_string.as_bytes())?;
    let signature = hex::encode(digest);
    digest.zeroize();
    Ok(signature)
}

/// 2つの署名文字列を定数時間で比較する。
/// 長さが異なる場合は内容を比較せず `false`。
pub fn constant_time_eq(expected: &str, supplied: &str) -> bool {
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}
