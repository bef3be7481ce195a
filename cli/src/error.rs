use std::path::PathBuf;

use at_core::domain::error::TranscribeError;

/// バイナリ側のエラー。ライブラリのエラーはそのまま包む。
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] TranscribeError),
    #[error("Cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl CliError {
    /// プロセスの終了コード
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Core(TranscribeError::Parameter(_)) | Self::Config { .. } => 2,
            Self::Core(TranscribeError::Cancelled) => 130,
            _ => 1,
        }
    }
}
