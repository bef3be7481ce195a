use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_transcribe::config::Credentials;

use crate::domain::error::TranscribeError;
use crate::domain::settings::AwsCredentials;

/// 認証情報とリトライ回数から AWS SDK の共通設定を組み立てる。
///
/// アクセスキーが明示されていればそれを使い（standard リトライ）、
/// なければ環境のデフォルトチェーンから読む（adaptive リトライ）。
pub async fn load_sdk_config(
    credentials: &AwsCredentials,
    max_attempts: u32,
) -> Result<SdkConfig, TranscribeError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = credentials.region.as_deref().filter(|r| !r.is_empty()) {
        loader = loader.region(Region::new(region.to_string()));
    }

    let retry = if credentials.is_explicit() {
        log::info!("Using configured AWS credentials.");
        let access_key_id = credentials.access_key_id.clone().unwrap_or_default();
        let secret_access_key = credentials.secret_access_key.clone().unwrap_or_default();
        if secret_access_key.is_empty() {
            return Err(TranscribeError::Parameter(
                "Secret access key has to be set together with the access key id".to_string(),
            ));
        }
        loader = loader.credentials_provider(Credentials::new(
            access_key_id,
            secret_access_key,
            credentials.session_token.clone().filter(|t| !t.is_empty()),
            None,
            "run-config",
        ));
        RetryConfig::standard().with_max_attempts(max_attempts)
    } else {
        log::info!("Attempting to load AWS credentials from environment.");
        RetryConfig::adaptive().with_max_attempts(max_attempts)
    };

    let config = loader.retry_config(retry).load().await;

    if config.region().is_none() {
        let message = "The region could not be loaded from environment variables. \
                       Please specify it in the configuration or set the environment variables.";
        log::error!("{message}");
        return Err(TranscribeError::Parameter(message.to_string()));
    }

    log::info!("AWS credentials loaded.");
    Ok(config)
}
