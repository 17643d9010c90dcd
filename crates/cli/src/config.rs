//! # CLI 入力設定
//!
//! initDataの入力元とボットトークンの指定。
//! ボットトークンは `--bot-token` または環境変数 `TELEGRAM_BOT_TOKEN` から読み込む。

use std::io::Read;
use std::path::PathBuf;

use clap::Args;

use crate::error::CliError;

/// ボットトークンを読み込む環境変数
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// initDataの入力元。どちらも指定されなければ標準入力から読む。
#[derive(Debug, Args)]
pub struct InputArgs {
    /// initData文字列
    #[arg(long, conflicts_with = "file")]
    pub init_data: Option<String>,
    /// initDataを含むファイル
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    /// initDataを読み込む。ファイル・標準入力の前後の空白は除く。
    pub fn read(&self) -> Result<String, CliError> {
        if let Some(init_data) = &self.init_data {
            return Ok(init_data.clone());
        }
        if let Some(path) = &self.file {
            let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;
            return Ok(content.trim().to_string());
        }
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(CliError::ReadStdin)?;
        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Args)]
pub struct TokenArgs {
    /// ボットトークン
    #[arg(long, env = BOT_TOKEN_ENV, hide_env_values = true)]
    pub bot_token: String,
}

/// `key=value` を分割する。値に含まれる `=` はそのまま残す。
pub fn parse_field(s: &str) -> Result<(String, String), CliError> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidField(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("auth_date=1716239022").unwrap(),
            ("auth_date".to_string(), "1716239022".to_string())
        );
        assert_eq!(
            parse_field("signature=abc==").unwrap(),
            ("signature".to_string(), "abc==".to_string())
        );
        assert_eq!(parse_field("empty=").unwrap().1, "");
    }

    #[test]
    fn test_parse_field_invalid() {
        assert!(matches!(parse_field("novalue"), Err(CliError::InvalidField(_))));
        assert!(matches!(parse_field("=x"), Err(CliError::InvalidField(_))));
    }

    /// ファイル入力は末尾の改行が除かれることを確認
    #[test]
    fn test_read_from_file_trims() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "auth_date=1&hash=abc").unwrap();

        let input = InputArgs {
            init_data: None,
            file: Some(file.path().to_path_buf()),
        };
        assert_eq!(input.read().unwrap(), "auth_date=1&hash=abc");
    }

    /// 直接指定はそのまま使われることを確認
    #[test]
    fn test_read_inline() {
        let input = InputArgs {
            init_data: Some(" a=1 ".to_string()),
            file: None,
        };
        assert_eq!(input.read().unwrap(), " a=1 ");
    }

    #[test]
    fn test_read_missing_file() {
        let input = InputArgs {
            init_data: None,
            file: Some(PathBuf::from("/nonexistent/initdata.txt")),
        };
        assert!(matches!(input.read(), Err(CliError::ReadFile { .. })));
    }
}
