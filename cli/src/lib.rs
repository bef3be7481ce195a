pub mod args;
pub mod error;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use at_core::domain::job::RunId;
use at_core::domain::settings::RunConfig;
use at_core::infra::clock::SystemClock;
use at_core::infra::metrics::MetricsSummary;
use at_core::infra::output::{column_schema, JsonLinesSink, RowSink};
use at_core::infra::sdk_config::load_sdk_config;
use at_core::infra::storage::{
    FolderTranscriptLoader, S3PathLister, S3TranscriptLoader, TranscriptLoader,
};
use at_core::infra::transcribe::AwsTranscribeService;
use at_core::usecase::client::{SubmitOptions, TranscriptionClient};
use at_core::usecase::run::TranscribeRun;

use crate::args::Cli;
use crate::error::CliError;

/// 引数から各コンポーネントを組み立てて1回分の実行を行う
pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<MetricsSummary, CliError> {
    let config = cli.run_config()?;
    let credentials = cli.credentials();
    log::debug!("Run configuration: {config:?}, credentials: {credentials:?}");

    let sdk = load_sdk_config(&credentials, config.max_attempts).await?;
    let storage = &config.storage;

    let loader: Arc<dyn TranscriptLoader> = match &cli.transcripts_dir {
        Some(dir) => {
            log::info!("Reading transcripts from {}", dir.display());
            Arc::new(FolderTranscriptLoader::new(dir))
        }
        None => Arc::new(S3TranscriptLoader::new(
            &sdk,
            storage.output_bucket(),
            &storage.response_prefix(),
        )),
    };
    let client = TranscriptionClient::new(
        Arc::new(AwsTranscribeService::new(&sdk)),
        loader,
        storage.clone(),
        SubmitOptions::from_config(&config)?,
    );
    let lister = S3PathLister::new(&sdk, &storage.input_bucket, &storage.input_root);

    if let Some(path) = &cli.schema {
        write_schema(path, &config)?;
    }

    let run = TranscribeRun::new(
        Arc::new(lister),
        Arc::new(client),
        Arc::new(SystemClock),
        config,
        cancel,
    )?;
    let run_id = RunId::generate(&cli.run_label);

    let mut sink = open_sink(cli.output.as_deref())?;
    let summary = run.execute(&run_id, sink.as_mut()).await?;
    Ok(summary)
}

fn open_sink(path: Option<&Path>) -> Result<Box<dyn RowSink>, CliError> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(JsonLinesSink::new(
                BufWriter::new(file),
                path.display().to_string(),
            )))
        }
        None => Ok(Box::new(JsonLinesSink::new(io::stdout(), "stdout"))),
    }
}

fn write_schema(path: &Path, config: &RunConfig) -> Result<(), CliError> {
    let to_cli_error = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(to_cli_error)?;
    let schema = column_schema(config.display_json);
    serde_json::to_writer_pretty(&mut file, &schema).map_err(io::Error::from).map_err(to_cli_error)?;
    file.write_all(b"\n").map_err(to_cli_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_file_lists_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        let config = RunConfig {
            display_json: true,
            ..Default::default()
        };

        write_schema(&path, &config).unwrap();
        let schema: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let columns = schema.as_array().unwrap();
        assert_eq!(columns.len(), 8);
        assert_eq!(columns[0]["name"], "path");
        assert_eq!(columns[7]["name"], "json");
    }

    #[test]
    fn test_sink_to_missing_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("rows.jsonl");
        let err = open_sink(Some(&path)).err().unwrap();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn test_sink_is_named_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        let sink = open_sink(Some(&path)).unwrap();
        assert_eq!(sink.name(), path.display().to_string());
    }
}
