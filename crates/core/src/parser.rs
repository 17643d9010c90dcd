//! # initDataパーサー
//!
//! `key1=value1&key2=value2` 形式の文字列をフィールドの対応表に変換する。
//!
//! - `&` で分割し、各ペアを最初の `=` で分割する（`=` がなければ値は空文字列）
//! - キーと値は `application/x-www-form-urlencoded` としてデコードする
//! - デコード後のバイト列がUTF-8として不正なら入力全体を拒否する（U+FFFDへの置換はしない）
//! - 同じキーが複数回現れた場合は最後の値を採用する
//! - 値がJSONとして解釈できれば `FieldValue::Json` として保持する

use initdata_types::{FieldValue, ParsedField, ParsedInitData};

use crate::CoreError;

/// initData文字列をパースする。
///
/// デコード結果がUTF-8として不正な場合のみ失敗する。
pub fn parse(raw: &str) -> Result<ParsedInitData, CoreError> {
    let mut parsed = ParsedInitData::new();
    for segment in raw.split('&').filter(|segment| !segment.is_empty()) {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        parsed.insert(decode_component(key)?, decode_field(decode_component(value)?));
    }
    tracing::trace!(fields = parsed.len(), "initDataをパースしました");
    Ok(parsed)
}

/// form-urlencodedの1要素をデコードする。`+` は空白として扱う。
fn decode_component(encoded: &str) -> Result<String, std::string::FromUtf8Error> {
    let unplussed = encoded.replace('+', " ");
    urlencoding::decode(&unplussed).map(|decoded| decoded.into_owned())
}

/// デコード済みの値を解釈する。
fn decode_field(text: String) -> ParsedField {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        return ParsedField::new(text, FieldValue::Json(value));
    }

    // JSONがさらにURLエンコードされている場合（構造化値のみ受け付ける）
    if text.contains('%') {
        if let Some(value) = decode_nested_json(&text) {
            return ParsedField::new(text, FieldValue::Json(value));
        }
    }

    ParsedField::text(text)
}

fn decode_nested_json(text: &str) -> Option<serde_json::Value> {
    let decoded = decode_component(text).ok()?;
    let value: serde_json::Value = serde_json::from_str(&decoded).ok()?;
    match value {
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => Some(value),
        _ => None,
    }
}
