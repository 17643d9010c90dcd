//! # Mini App initData 共有型定義
//!
//! initDataのパース結果と、プラットフォームが定義する既知フィールドの型を提供する。
//!
//! ## 値の表現
//! - `FieldValue::Text`: JSONとして解釈できなかった文字列
//! - `FieldValue::Json`: JSONとして解釈できた値（オブジェクト・配列・スカラー）
//!
//! 各フィールドはデコード済みの元テキストも保持する。
//! スカラー値は署名時のテキストそのままでチェック文字列に載るため。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

/// 署名フィールドのキー
pub const HASH_KEY: &str = "hash";

// ---------------------------------------------------------------------------
// フィールド値
// ---------------------------------------------------------------------------

/// initDataの1フィールドの値。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// JSONとして解釈できなかった文字列
    Text(String),
    /// JSONとして解釈できた値
    Json(serde_json::Value),
}

impl FieldValue {
    /// オブジェクトまたは配列か
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            FieldValue::Json(serde_json::Value::Object(_) | serde_json::Value::Array(_))
        )
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            FieldValue::Json(v) => Some(v),
            FieldValue::Text(_) => None,
        }
    }
}

/// パース済みフィールド。デコード済みの元テキストと解釈結果の組。
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedField {
    raw: String,
    value: FieldValue,
}

impl ParsedField {
    pub fn new(raw: impl Into<String>, value: FieldValue) -> Self {
        Self {
            raw: raw.into(),
            value,
        }
    }

    /// JSONとして解釈しない文字列フィールドを作る。
    pub fn text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            value: FieldValue::Text(raw.clone()),
            raw,
        }
    }

    /// URLデコード済みの元テキスト
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

impl Serialize for ParsedField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// パース済みinitData
// ---------------------------------------------------------------------------

/// キー → フィールドの対応表。キーはバイト順で整列される。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedInitData {
    fields: BTreeMap<String, ParsedField>,
}

impl ParsedInitData {
    pub fn new() -> Self {
        Self::default()
    }

    /// フィールドを追加する。同じキーが既にあれば置き換え、古い値を返す。
    pub fn insert(&mut self, key: impl Into<String>, field: ParsedField) -> Option<ParsedField> {
        self.fields.insert(key.into(), field)
    }

    pub fn get(&self, key: &str) -> Option<&ParsedField> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// 受信した `hash` フィールドの値
    pub fn hash(&self) -> Option<&str> {
        self.get(HASH_KEY).map(ParsedField::raw)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// キー昇順のイテレータ
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParsedField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 署名対象のフィールド（`hash` 以外）をキー昇順で返す。
    pub fn signed_fields(&self) -> impl Iterator<Item = (&str, &ParsedField)> {
        self.iter().filter(|(k, _)| *k != HASH_KEY)
    }

    fn raw_of(&self, key: &str) -> Option<&str> {
        self.get(key).map(ParsedField::raw)
    }

    /// 構造化フィールドを型付きで取り出す。型が合わなければ `None`。
    pub fn structured<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let field = self.get(key)?;
        if !field.value().is_structured() {
            return None;
        }
        let value = field.value().as_json()?.clone();
        serde_json::from_value(value).ok()
    }

    // -----------------------------------------------------------------------
    // 既知フィールド
    // -----------------------------------------------------------------------

    /// `auth_date`（UNIX秒）
    pub fn auth_date(&self) -> Option<i64> {
        self.raw_of("auth_date")?.trim().parse().ok()
    }

    pub fn auth_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.auth_date()?, 0)
    }

    pub fn query_id(&self) -> Option<&str> {
        self.raw_of("query_id")
    }

    pub fn start_param(&self) -> Option<&str> {
        self.raw_of("start_param")
    }

    /// `chat_type`（"sender", "private", "group", "supergroup", "channel"）
    pub fn chat_type(&self) -> Option<&str> {
        self.raw_of("chat_type")
    }

    pub fn chat_instance(&self) -> Option<&str> {
        self.raw_of("chat_instance")
    }

    /// Mini Appを開いたユーザー
    pub fn user(&self) -> Option<WebAppUser> {
        self.structured("user")
    }

    /// 添付メニューから開かれた場合のチャット相手
    pub fn receiver(&self) -> Option<WebAppUser> {
        self.structured("receiver")
    }

    pub fn chat(&self) -> Option<WebAppChat> {
        self.structured("chat")
    }
}

impl FromIterator<(String, ParsedField)> for ParsedInitData {
    fn from_iter<I: IntoIterator<Item = (String, ParsedField)>>(iter: I) -> Self {
        let mut parsed = ParsedInitData::new();
        for (key, field) in iter {
            parsed.insert(key, field);
        }
        parsed
    }
}

impl Serialize for ParsedInitData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter())
    }
}

// ---------------------------------------------------------------------------
// 既知の構造化フィールド
// ---------------------------------------------------------------------------

/// `user` / `receiver` フィールドの内容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebAppUser {
    /// ユーザーID
    pub id: i64,
    /// ボットかどうか（`receiver` のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bot: Option<bool>,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// IETF言語タグ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_to_attachment_menu: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_write_to_pm: Option<bool>,
    /// プロフィール画像のURL（.jpeg または .svg）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// `chat` フィールドの内容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebAppChat {
    pub id: i64,
    /// "group", "supergroup", "channel"
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}
