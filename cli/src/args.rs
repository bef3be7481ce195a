use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use at_core::domain::settings::{AwsCredentials, ErrorHandling, ListMode, RunConfig};

use crate::error::CliError;

/// 入力フォルダの音声を一括で書き起こし、1ファイル1行の JSON Lines を書き出す。
#[derive(Debug, Parser)]
#[command(
    name = "transcribe-batch",
    version,
    about = "Transcribe a folder of audio files with Amazon Transcribe",
    long_about = None
)]
pub struct Cli {
    /// Base configuration file (JSON). Flags below override its values.
    #[arg(long, env = "AT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bucket holding the input audio files
    #[arg(long, env = "AT_INPUT_BUCKET")]
    pub input_bucket: Option<String>,

    /// Folder inside the input bucket
    #[arg(long, env = "AT_INPUT_ROOT")]
    pub input_root: Option<String>,

    /// Bucket receiving the service output (defaults to the input bucket)
    #[arg(long, env = "AT_OUTPUT_BUCKET")]
    pub output_bucket: Option<String>,

    /// Folder inside the output bucket (defaults to the input root)
    #[arg(long, env = "AT_OUTPUT_ROOT")]
    pub output_root: Option<String>,

    /// Language code, or "auto" for language identification
    #[arg(long, short)]
    pub language: Option<String>,

    /// Include the raw result JSON in each row
    #[arg(long)]
    pub display_json: bool,

    /// Give up on jobs still pending after this many minutes
    #[arg(long)]
    pub timeout_minutes: Option<u32>,

    /// Number of concurrent submissions (1-100)
    #[arg(long, short = 'j')]
    pub workers: Option<usize>,

    /// Retry attempts for each AWS call
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Seconds between two polls of the job list
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Query the job list once per status instead of once overall
    #[arg(long)]
    pub list_per_status: bool,

    /// What to do when a submission fails
    #[arg(long, value_enum)]
    pub on_error: Option<OnError>,

    /// Enable speaker partitioning with up to this many speakers
    #[arg(long)]
    pub max_speakers: Option<u32>,

    /// Redact personally identifiable information
    #[arg(long)]
    pub redact_pii: bool,

    /// PII entity types to redact (comma separated, default ALL)
    #[arg(long, value_delimiter = ',')]
    pub pii_types: Vec<String>,

    /// Read result JSON from this local folder instead of the output bucket
    #[arg(long)]
    pub transcripts_dir: Option<PathBuf>,

    /// Output file (JSON Lines). Standard output when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Also write the column descriptions to this file
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Prefix of the run id used to name the jobs
    #[arg(long, default_value = "run")]
    pub run_label: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnError {
    /// Abort the whole run on the first failed submission
    Fail,
    /// Record the failure in the row and continue
    Log,
}

impl From<OnError> for ErrorHandling {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Fail => ErrorHandling::Fail,
            OnError::Log => ErrorHandling::Log,
        }
    }
}

impl Cli {
    /// 設定ファイル（あれば）を土台に、指定されたフラグで上書きした実行設定を返す
    pub fn run_config(&self) -> Result<RunConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str::<RunConfig>(&raw).map_err(|source| CliError::Config {
                    path: path.clone(),
                    source,
                })?
            }
            None => RunConfig::default(),
        };

        override_with(&mut config.storage.input_bucket, &self.input_bucket);
        override_with(&mut config.storage.input_root, &self.input_root);
        if self.output_bucket.is_some() {
            config.storage.output_bucket = self.output_bucket.clone();
        }
        if self.output_root.is_some() {
            config.storage.output_root = self.output_root.clone();
        }
        override_with(&mut config.language, &self.language);

        config.display_json |= self.display_json;
        if let Some(minutes) = self.timeout_minutes {
            config.use_timeout = true;
            config.timeout_minutes = minutes;
        }
        override_with(&mut config.parallel_workers, &self.workers);
        override_with(&mut config.max_attempts, &self.max_attempts);
        override_with(&mut config.poll_interval_secs, &self.poll_interval);
        if self.list_per_status {
            config.list_mode = ListMode::PerStatus;
        }
        if let Some(on_error) = self.on_error {
            config.error_handling = on_error.into();
        }
        if self.max_speakers.is_some() {
            config.max_speaker_labels = self.max_speakers;
        }
        config.redact_pii |= self.redact_pii;
        if !self.pii_types.is_empty() {
            config.pii_types = self.pii_types.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn credentials(&self) -> AwsCredentials {
        AwsCredentials {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
            region: self.region.clone(),
        }
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["transcribe-batch"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = parse(&[
            "--input-bucket",
            "audio",
            "--input-root",
            "calls",
            "--language",
            "fr-FR",
            "--timeout-minutes",
            "30",
            "-j",
            "8",
            "--list-per-status",
            "--on-error",
            "log",
            "--redact-pii",
            "--pii-types",
            "NAME,SSN",
        ]);
        let config = cli.run_config().unwrap();

        assert_eq!(config.storage.input_bucket, "audio");
        assert_eq!(config.storage.output_root(), "calls");
        assert_eq!(config.language, "fr-FR");
        assert!(config.use_timeout);
        assert_eq!(config.timeout_minutes, 30);
        assert_eq!(config.parallel_workers, 8);
        assert_eq!(config.list_mode, ListMode::PerStatus);
        assert_eq!(config.error_handling, ErrorHandling::Log);
        assert_eq!(config.pii_types, vec!["NAME", "SSN"]);
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = parse(&["--input-bucket", "audio"]);
        let config = cli.run_config().unwrap();
        assert_eq!(config.language, "auto");
        assert!(!config.use_timeout);
        assert_eq!(config.parallel_workers, 4);
        assert_eq!(config.error_handling, ErrorHandling::Fail);
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let cli = parse(&["--input-bucket", "audio", "--pii-types", "PASSPORT", "--redact-pii"]);
        assert!(matches!(cli.run_config(), Err(CliError::Core(_))));

        let cli = parse(&["--input-bucket", "audio", "-j", "101"]);
        assert!(matches!(cli.run_config(), Err(CliError::Core(_))));
    }

    #[test]
    fn test_config_file_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"language": "de-DE", "parallel_workers": 10,
                "storage": {"input_bucket": "from-file", "input_root": "in"}}"#,
        )
        .unwrap();

        let cli = parse(&["--config", path.to_str().unwrap(), "--language", "it-IT"]);
        let config = cli.run_config().unwrap();
        assert_eq!(config.language, "it-IT");
        assert_eq!(config.parallel_workers, 10);
        assert_eq!(config.storage.input_bucket, "from-file");
        assert_eq!(config.max_attempts, 20);
    }

    #[test]
    fn test_broken_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, "{ not json").unwrap();

        let cli = parse(&["--config", path.to_str().unwrap()]);
        assert!(matches!(cli.run_config(), Err(CliError::Config { .. })));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let cli = parse(&[
            "--input-bucket",
            "audio",
            "--access-key-id",
            "AKIAEXAMPLE",
            "--secret-access-key",
            "very-secret",
            "--region",
            "eu-west-1",
        ]);
        let rendered = format!("{:?}", cli.credentials());
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("AKIAEXAMPLE"));
        assert!(rendered.contains("eu-west-1"));
    }
}
