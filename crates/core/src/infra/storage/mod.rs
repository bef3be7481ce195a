mod folder;
mod s3;

pub use folder::FolderTranscriptLoader;
pub use s3::{S3PathLister, S3TranscriptLoader};

use async_trait::async_trait;

use crate::domain::error::TranscribeError;

/// 入力フォルダの音声パス列挙
#[async_trait]
pub trait PathLister: Send + Sync {
    /// 拡張子が `extensions` に一致するパスを返す（ルートからの相対、先頭 "/"）
    async fn list_paths(&self, extensions: &[&str]) -> Result<Vec<String>, TranscribeError>;
}

/// 完了ジョブの結果 JSON の読み出し
#[async_trait]
pub trait TranscriptLoader: Send + Sync {
    /// `name` はサービスが書き出したオブジェクト名（拡張子なし）
    async fn load(&self, name: &str) -> Result<serde_json::Value, TranscribeError>;
}

/// S3 キーを入力ルートからの相対パスに変換する。
/// ルート外のキーやフォルダマーカーは None。
pub fn path_from_key(root: &str, key: &str) -> Option<String> {
    if key.ends_with('/') {
        return None;
    }
    let root = root.trim_matches('/');
    let relative = if root.is_empty() {
        key
    } else {
        key.strip_prefix(root)?.strip_prefix('/')?
    };
    if relative.is_empty() {
        None
    } else {
        Some(format!("/{relative}"))
    }
}
