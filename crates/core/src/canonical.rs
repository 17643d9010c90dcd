//! # チェック文字列の構築
//!
//! 署名対象のバイト列を再構築する。
//!
//! - `hash` を除いた全フィールドをキーのバイト順に並べる
//! - 各フィールドを `key=value` として `\n` で連結する（末尾の改行なし）
//! - オブジェクト・配列は署名者と同じ規則でJSONに再シリアライズする
//! - スカラー値はデコード済みの元テキストをそのまま使う
//!
//! ## 署名者のJSON規則
//! - 空白なしのコンパクト形式、オブジェクトのキー順は受信順
//! - 非ASCII文字はエスケープしない
//! - `/` は `\/`、U+2028 / U+2029 は `\u2028` / `\u2029` にエスケープする
//! - 制御文字は `\b \f \n \r \t`、それ以外は `\u00XX`
//! - 数値は受信した表記のまま

use std::borrow::Cow;
use std::io;

use serde::Serialize;

use initdata_types::{FieldValue, ParsedField, ParsedInitData};

/// 署名者のJSON規則で文字列をエスケープするFormatter。
/// それ以外はコンパクト形式（`Formatter` のデフォルト実装）。
struct SignerFormatter;

impl serde_json::ser::Formatter for SignerFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '/' => "\\/",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// JSON値を署名者の規則でシリアライズする。
pub fn to_signer_json(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SignerFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

/// フィールドの値をチェック文字列用に描画する。
///
/// JSON文字列スカラーは引用符を外さず、デコード済みテキスト（`"x"`）のまま使う。
/// 引用符を外してから署名する実装とは意図的に異なる。プラットフォームは受信した
/// テキストそのものに署名するため、こちらに合わせる。
fn render_value(field: &ParsedField) -> Cow<'_, str> {
    match field.value() {
        FieldValue::Json(value) if field.value().is_structured() => match to_signer_json(value) {
            Ok(text) => Cow::Owned(text),
            Err(e) => {
                tracing::warn!(error = %e, "構造化フィールドのシリアライズに失敗したため元テキストを使用します");
                Cow::Borrowed(field.raw())
            }
        },
        _ => Cow::Borrowed(field.raw()),
    }
}

/// `hash` 以外のフィールドからチェック文字列を構築する。
/// フィールドの受信順には依存しない。
pub fn build_check_string(fields: &ParsedInitData) -> String {
    fields
        .signed_fields()
        .map(|(key, field)| format!("{key}={}", render_value(field)))
        .collect::<Vec<_>>()
        .join("\n")
}
