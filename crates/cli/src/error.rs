//! # CLI エラー型

/// CLIエラー型。
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// 入力ファイルの読み込みに失敗
    #[error("initDataファイルの読み込みに失敗: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 標準入力の読み込みに失敗
    #[error("標準入力の読み込みに失敗: {0}")]
    ReadStdin(#[source] std::io::Error),
    /// `--field` の形式が不正
    #[error("フィールドは key=value 形式で指定してください: {0}")]
    InvalidField(String),
    /// デコード・署名の失敗
    #[error(transparent)]
    Core(#[from] initdata_core::CoreError),
}
