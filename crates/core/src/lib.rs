//! # Mini App initData Core
//!
//! Mini AppがバックエンドへPOSTするinitDataの署名検証を実装する。
//!
//! ## 処理フロー
//! 1. クエリ文字列をパースし、JSON値を含むフィールドを解釈する（[`parse`]）
//! 2. `hash` 以外のフィールドからチェック文字列を再構築する（[`build_check_string`]）
//! 3. ボットトークンから秘密鍵を導出し、チェック文字列の署名を計算する
//! 4. 受信した `hash` と定数時間で比較する（[`is_valid`], [`validate`]）
//!
//! 失敗理由は区別しない。空入力・`hash` 欠落・改ざん・トークン違い・UTF-8として不正なエンコードは
//! すべて「無効」になる。
//! 全関数は状態を持たず、任意のスレッドから同時に呼び出せる。

mod canonical;
mod parser;
mod report;
mod signer;
mod verifier;

pub use canonical::{build_check_string, to_signer_json};
pub use parser::parse;
pub use report::{ValidationData, ValidationReport};
pub use signer::{encode_pairs, sign};
pub use verifier::{is_valid, validate, validate_with, Validation};

pub use initdata_crypto::SecretKey;
pub use initdata_types::{FieldValue, ParsedField, ParsedInitData, WebAppChat, WebAppUser, HASH_KEY};

/// Coreモジュールのエラー型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// 署名計算エラー
    #[error("署名の計算に失敗しました: {0}")]
    Crypto(#[from] initdata_crypto::CryptoError),
    /// デコード結果がUTF-8として不正
    #[error("initDataのデコード結果がUTF-8として不正です: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),
}
