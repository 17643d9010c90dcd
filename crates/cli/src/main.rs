//! # initData CLI
//!
//! initDataの検証・チェック文字列の表示・署名をコマンドラインから行う。
//!
//! ## コマンド
//! - `validate`: 署名を検証する（有効なら終了コード0、無効なら1）
//! - `check-string`: 署名対象のチェック文字列を表示する
//! - `sign`: フィールドに署名したinitDataを出力する
//!
//! ボットトークンは `--bot-token` または `TELEGRAM_BOT_TOKEN` で指定する。
//! ログは `RUST_LOG` で制御し、標準エラー出力に書き出す。

mod config;
mod error;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{parse_field, InputArgs, TokenArgs};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "initdata-cli", version, about = "Mini App initData validator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// initDataの署名を検証する
    Validate {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        token: TokenArgs,
        /// 中間生成物をJSONで出力する（秘密鍵を含む）
        #[arg(long)]
        verbose: bool,
    },
    /// チェック文字列を表示する
    CheckString {
        #[command(flatten)]
        input: InputArgs,
    },
    /// フィールドに署名したinitDataを出力する
    Sign {
        /// key=value（複数指定可）
        #[arg(long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
        #[command(flatten)]
        token: TokenArgs,
    },
}

/// コマンドを実行し、成功したかを返す。
fn run(command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Validate {
            input,
            token,
            verbose,
        } => {
            let init_data = input.read()?;
            let report = initdata_core::validate(&init_data, &token.bot_token);
            if verbose {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", if report.is_valid { "valid" } else { "invalid" });
            }
            tracing::info!(is_valid = report.is_valid, "検証が完了しました");
            Ok(report.is_valid)
        }
        Command::CheckString { input } => {
            let init_data = input.read()?;
            let parsed = initdata_core::parse(&init_data).map_err(CliError::from)?;
            println!("{}", initdata_core::build_check_string(&parsed));
            Ok(true)
        }
        Command::Sign { fields, token } => {
            let pairs: Vec<(&str, &str)> = fields
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let signed = initdata_core::sign(&pairs, &token.bot_token).map_err(CliError::from)?;
            println!("{signed}");
            Ok(true)
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if run(cli.command)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
