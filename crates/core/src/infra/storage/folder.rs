use std::path::PathBuf;

use async_trait::async_trait;

use super::TranscriptLoader;
use crate::domain::error::TranscribeError;

/// ローカルフォルダから結果 JSON (`{dir}/{name}.json`) を読む。
/// 出力バケットをマウント/同期している場合に使う。
pub struct FolderTranscriptLoader {
    dir: PathBuf,
}

impl FolderTranscriptLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TranscriptLoader for FolderTranscriptLoader {
    async fn load(&self, name: &str) -> Result<serde_json::Value, TranscribeError> {
        let path = self.dir.join(format!("{name}.json"));
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| TranscribeError::TranscriptLoad(format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            TranscribeError::ResponseFormat(format!("{} is not valid JSON: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loads_json_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("run_1_abc.json"),
            r#"{"results":{"transcripts":[{"transcript":"hello"}]}}"#,
        )
        .unwrap();

        let loader = FolderTranscriptLoader::new(dir.path());
        let value = loader.load("run_1_abc").await.unwrap();
        assert_eq!(
            value.pointer("/results/transcripts/0/transcript").unwrap(),
            "hello"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FolderTranscriptLoader::new(dir.path());
        let err = loader.load("nope").await.unwrap_err();
        assert!(matches!(err, TranscribeError::TranscriptLoad(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "not json").unwrap();
        let loader = FolderTranscriptLoader::new(dir.path());
        let err = loader.load("bad").await.unwrap_err();
        assert!(matches!(err, TranscribeError::ResponseFormat(_)));
    }
}
