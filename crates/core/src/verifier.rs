//! # initData署名検証
//!
//! 1. 空入力は即座に無効（パース・ハッシュ計算は行わない）
//! 2. パース → チェック文字列構築（UTF-8として不正なエンコードは無効）
//! 3. `secret_key = HMAC-SHA256("WebAppData", bot_token)`
//! 4. `calculated = hex(HMAC-SHA256(secret_key, check_string))`
//! 5. 受信した `hash` と定数時間で比較する。`hash` がなければ空文字列と比較する

use serde::Serialize;

use initdata_crypto::{constant_time_eq, derive_secret_key, sign_check_string};

use crate::report::{ValidationData, ValidationReport};
use crate::{build_check_string, parse};

/// [`validate_with`] の結果。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Validation {
    /// 通常モード: 真偽値のみ
    Plain(bool),
    /// 詳細モード: 中間生成物つき
    Verbose(ValidationReport),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        match self {
            Validation::Plain(valid) => *valid,
            Validation::Verbose(report) => report.is_valid,
        }
    }
}

/// initDataが `bot_token` で署名されたものか検証する。
pub fn is_valid(init_data: &str, bot_token: &str) -> bool {
    validate(init_data, bot_token).is_valid
}

/// initDataを検証し、中間生成物を含む結果を返す。
///
/// 戻り値の `secret_key` は呼び出し側で外部に公開しないこと。
pub fn validate(init_data: &str, bot_token: &str) -> ValidationReport {
    if init_data.is_empty() {
        tracing::debug!("initDataが空のため無効と判定しました");
        return ValidationReport::invalid();
    }

    let parsed = match parse(init_data) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "initDataをデコードできないため無効と判定しました");
            return ValidationReport::invalid();
        }
    };
    let check_string = build_check_string(&parsed);

    let secret_key = match derive_secret_key(bot_token) {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!(error = %e, "秘密鍵の導出に失敗したため無効と判定しました");
            return ValidationReport::invalid();
        }
    };
    let calculated_hash = match sign_check_string(&secret_key, &check_string) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!(error = %e, "署名の計算に失敗したため無効と判定しました");
            return ValidationReport::invalid();
        }
    };

    let parsed_hash = parsed.hash().unwrap_or_default().to_string();
    let is_valid = constant_time_eq(&calculated_hash, &parsed_hash);

    tracing::debug!(
        is_valid,
        fields = parsed.len(),
        has_hash = parsed.hash().is_some(),
        "initDataを検証しました"
    );

    ValidationReport {
        is_valid,
        data: Some(ValidationData {
            parsed,
            calculated_hash,
            parsed_hash,
            check_string,
            secret_key,
        }),
    }
}

/// 通常モードと詳細モードを1つの入口で切り替える。
pub fn validate_with(init_data: &str, bot_token: &str, verbose: bool) -> Validation {
    if verbose {
        Validation::Verbose(validate(init_data, bot_token))
    } else {
        Validation::Plain(is_valid(init_data, bot_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign;

    const BOT_TOKEN: &str = "5768337691:AAH5YkoiEuPk8-FZa32hStHTqXiLPtAEhx8";

    /// 既知のinitDataと署名
    const SIGNED_HASH: &str = "ebcc2b1838387aa6e868a52ee1283d6f0438759df278efff6ceca5a37ff510dc";

    fn signed_init_data() -> String {
        format!(
            "query_id=AAHdF6IQAAAAAN0XohDhrOrc&user=%7B%22id%22%3A78787878%2C%22first_name%22%3A%22%E3%82%AD%E3%83%A3%E3%83%A9%E3%82%AF%E3%82%BF%E3%83%BC%E3%82%BB%E3%83%83%E3%83%88%22%2C%22last_name%22%3A%22last-name%22%2C%22username%22%3A%22characterset%22%2C%22language_code%22%3A%22ja%22%2C%22allows_write_to_pm%22%3Atrue%7D&auth_date=1716239022&hash={SIGNED_HASH}"
        )
    }

    /// 正しい署名のinitDataが有効と判定されることを確認
    #[test]
    fn test_valid_init_data() {
        assert!(is_valid(&signed_init_data(), BOT_TOKEN));
    }

    /// 詳細モードで中間生成物が揃っていることを確認
    #[test]
    fn test_validate_verbose_bundle() {
        let report = validate(&signed_init_data(), BOT_TOKEN);
        assert!(report.is_valid);

        let data = report.data.as_ref().unwrap();
        assert_eq!(data.calculated_hash, SIGNED_HASH);
        assert_eq!(data.parsed_hash, SIGNED_HASH);
        assert_eq!(
            data.check_string,
            "auth_date=1716239022\nquery_id=AAHdF6IQAAAAAN0XohDhrOrc\nuser={\"id\":78787878,\"first_name\":\"キャラクターセット\",\"last_name\":\"last-name\",\"username\":\"characterset\",\"language_code\":\"ja\",\"allows_write_to_pm\":true}"
        );
        assert_eq!(
            data.secret_key.to_hex(),
            "a5c609aa52f63cb5e6d8ceb6e4138726ea82bbc36bb786d64482d445ea38ee5f"
        );

        let user = data.parsed.user().unwrap();
        assert_eq!(user.id, 78787878);
        assert_eq!(user.first_name, "キャラクターセット");
    }

    /// 空入力は無効で、中間生成物を持たないことを確認
    #[test]
    fn test_empty_init_data() {
        assert!(!is_valid("", BOT_TOKEN));
        let report = validate("", BOT_TOKEN);
        assert!(!report.is_valid);
        assert!(report.data.is_none());
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"isValid":false,"data":{}}"#
        );
    }

    /// 別のトークンでは無効になることを確認
    #[test]
    fn test_wrong_bot_token() {
        assert!(!is_valid(&signed_init_data(), "5768337691:AAH5YkoiEuPk8-FZa32hStHTqXiLPtAEhx9"));
        assert!(!is_valid(&signed_init_data(), ""));
    }

    /// hashが欠落していても比較は行われ、無効になることを確認
    #[test]
    fn test_missing_hash() {
        let report = validate("auth_date=1716239022&query_id=AAH", BOT_TOKEN);
        assert!(!report.is_valid);
        let data = report.data.unwrap();
        assert_eq!(data.parsed_hash, "");
        assert_eq!(data.calculated_hash.len(), 64);
    }

    /// hashの大文字化は無効になることを確認
    #[test]
    fn test_uppercase_hash_rejected() {
        let tampered = signed_init_data().replace(SIGNED_HASH, &SIGNED_HASH.to_uppercase());
        assert!(!is_valid(&tampered, BOT_TOKEN));
    }

    /// フィールドの並び替えでは結果が変わらないことを確認
    #[test]
    fn test_field_reorder_still_valid() {
        let raw = signed_init_data();
        let mut pairs: Vec<&str> = raw.split('&').collect();
        pairs.reverse();
        assert!(is_valid(&pairs.join("&"), BOT_TOKEN));
    }

    /// 値の改ざんで無効になることを確認
    #[test]
    fn test_tampered_value() {
        let tampered = signed_init_data().replace("auth_date=1716239022", "auth_date=1716239023");
        assert!(!is_valid(&tampered, BOT_TOKEN));
        let tampered = signed_init_data().replace("last-name", "last-nane");
        assert!(!is_valid(&tampered, BOT_TOKEN));
    }

    /// 不正なUTF-8のバイト列がU+FFFDを含む署名済みの値の代わりにならないことを確認
    #[test]
    fn test_invalid_utf8_cannot_replace_signed_replacement_char() {
        let raw = sign(&[("start_param", "a\u{FFFD}b"), ("auth_date", "1")], BOT_TOKEN).unwrap();
        assert!(raw.contains("a%EF%BF%BDb"));
        assert!(is_valid(&raw, BOT_TOKEN));

        for forged_bytes in ["a%FFb", "a%FEb", "a%C3b"] {
            let forged = raw.replace("a%EF%BF%BDb", forged_bytes);
            assert!(!is_valid(&forged, BOT_TOKEN), "{forged_bytes} が有効と判定されました");
            let report = validate(&forged, BOT_TOKEN);
            assert!(!report.is_valid);
            assert!(report.data.is_none());
        }
    }

    /// フィールド追加で無効になることを確認
    #[test]
    fn test_extra_field_rejected() {
        let extended = format!("{}&start_param=x", signed_init_data());
        assert!(!is_valid(&extended, BOT_TOKEN));
    }

    /// 同じ入力に対して決定論的であることを確認
    #[test]
    fn test_deterministic() {
        let a = validate(&signed_init_data(), BOT_TOKEN);
        let b = validate(&signed_init_data(), BOT_TOKEN);
        assert_eq!(a, b);
    }

    /// validate_withが両モードで同じ判定を返すことを確認
    #[test]
    fn test_validate_with_modes() {
        let raw = signed_init_data();
        assert_eq!(validate_with(&raw, BOT_TOKEN, false), Validation::Plain(true));
        let verbose = validate_with(&raw, BOT_TOKEN, true);
        assert!(matches!(verbose, Validation::Verbose(_)));
        assert!(verbose.is_valid());
        assert!(!validate_with("", BOT_TOKEN, true).is_valid());
    }

    /// signで作ったinitDataが検証を通ることを確認
    #[test]
    fn test_sign_roundtrip() {
        let raw = sign(
            &[
                ("auth_date", "1716239022"),
                ("chat_type", "sender"),
                ("user", r#"{"id":1,"first_name":"名前","photo_url":"https:\/\/t.me\/i\/a.svg"}"#),
            ],
            BOT_TOKEN,
        )
        .unwrap();
        assert!(is_valid(&raw, BOT_TOKEN));
    }

    /// 詳細モードのシリアライズ結果のキーを確認
    #[test]
    fn test_report_serialization_keys() {
        let value = serde_json::to_value(validate(&signed_init_data(), BOT_TOKEN)).unwrap();
        assert_eq!(value["isValid"], serde_json::json!(true));
        let data = &value["data"];
        for key in ["parsed", "calculatedHash", "parsedHash", "checkString", "secretKey"] {
            assert!(data.get(key).is_some(), "{key} がありません");
        }
        assert_eq!(data["parsed"]["user"]["id"], serde_json::json!(78787878));
        assert_eq!(data["parsed"]["query_id"], serde_json::json!("AAHdF6IQAAAAAN0XohDhrOrc"));
    }
}
