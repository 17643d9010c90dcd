//! # 検証結果の診断情報
//!
//! 詳細モードで返す中間生成物。開発時のデバッグ用であり、
//! `secret_key` を含むためエンドユーザーへ返してはならない。

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use initdata_crypto::SecretKey;
use initdata_types::ParsedInitData;

/// 詳細モードの検証結果。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    /// 空入力の場合は `None`（`{}` としてシリアライズされる）
    #[serde(serialize_with = "serialize_data")]
    pub data: Option<ValidationData>,
}

/// 検証の中間生成物。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationData {
    /// パース済みフィールド
    pub parsed: ParsedInitData,
    /// 計算した署名（小文字hex、64文字）
    pub calculated_hash: String,
    /// 受信した `hash` フィールドの値（欠落時は空文字列）
    pub parsed_hash: String,
    pub check_string: String,
    /// 導出した秘密鍵（hexでシリアライズされる）
    pub secret_key: SecretKey,
}

impl ValidationReport {
    /// 中間生成物のない無効結果
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            data: None,
        }
    }

    pub fn parsed(&self) -> Option<&ParsedInitData> {
        self.data.as_ref().map(|d| &d.parsed)
    }
}

fn serialize_data<S: Serializer>(
    data: &Option<ValidationData>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match data {
        Some(data) => data.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}
