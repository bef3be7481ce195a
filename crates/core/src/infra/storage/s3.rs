use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;

use super::{path_from_key, PathLister, TranscriptLoader};
use crate::domain::error::TranscribeError;
use crate::domain::language::has_extension;

/// S3 バケット内のルート配下を列挙する
pub struct S3PathLister {
    client: aws_sdk_s3::Client,
    bucket: String,
    root: String,
}

impl S3PathLister {
    pub fn new(config: &aws_config::SdkConfig, bucket: &str, root: &str) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket: bucket.to_string(),
            root: root.to_string(),
        }
    }
}

#[async_trait]
impl PathLister for S3PathLister {
    async fn list_paths(&self, extensions: &[&str]) -> Result<Vec<String>, TranscribeError> {
        let root = self.root.trim_matches('/');
        let prefix = (!root.is_empty()).then(|| format!("{root}/"));

        let mut paths = Vec::new();
        let mut continuation_token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(prefix.clone())
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    TranscribeError::Storage(format!(
                        "Could not list s3://{}/{}: {}",
                        self.bucket,
                        root,
                        DisplayErrorContext(&e)
                    ))
                })?;

            paths.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter_map(|key| path_from_key(root, key))
                    .filter(|path| has_extension(path, extensions)),
            );

            match output.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        log::info!(
            "Found {} audio files under s3://{}/{}",
            paths.len(),
            self.bucket,
            root
        );
        Ok(paths)
    }
}

/// 出力バケットから結果 JSON (`{prefix}{name}.json`) を読む
pub struct S3TranscriptLoader {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl S3TranscriptLoader {
    /// `prefix` は末尾 "/" 付きのキー接頭辞
    pub fn new(config: &aws_config::SdkConfig, bucket: &str, prefix: &str) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

#[async_trait]
impl TranscriptLoader for S3TranscriptLoader {
    async fn load(&self, name: &str) -> Result<serde_json::Value, TranscribeError> {
        let key = format!("{}{}.json", self.prefix, name);
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                TranscribeError::TranscriptLoad(format!(
                    "s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| TranscribeError::TranscriptLoad(format!("s3://{}/{}: {e}", self.bucket, key)))?
            .into_bytes();

        serde_json::from_slice(&bytes).map_err(|e| {
            TranscribeError::ResponseFormat(format!("s3://{}/{} is not valid JSON: {e}", self.bucket, key))
        })
    }
}
