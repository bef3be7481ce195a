use std::sync::Arc;
use std::time::Instant;

use crate::domain::error::TranscribeError;
use crate::domain::job::{Job, JobStatus, JobStatusRecord, RunId, AUTO_LANGUAGE};
use crate::domain::language;
use crate::domain::settings::{RunConfig, StorageConfig};
use crate::infra::metrics::Metrics;
use crate::infra::storage::TranscriptLoader;
use crate::infra::transcribe::{
    LanguageSelection, ListJobsQuery, PiiRedaction, StartJobRequest, TranscribeService,
};

/// 秘匿化有効時にサービスが結果オブジェクト名へ付けるプレフィックス
pub const REDACTED_PREFIX: &str = "redacted-";

/// 投入リクエストへそのまま渡すオプション
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub max_speaker_labels: Option<u32>,
    /// Some なら PII 秘匿化を有効にする
    pub pii_types: Option<Vec<String>>,
}

impl SubmitOptions {
    pub fn from_config(config: &RunConfig) -> Result<Self, TranscribeError> {
        let pii_types = if config.redact_pii {
            Some(config.normalized_pii_types()?)
        } else {
            None
        };
        Ok(Self {
            max_speaker_labels: config.max_speaker_labels,
            pii_types,
        })
    }
}

/// 書き起こしサービスの型付きファサード。
///
/// ジョブ名の生成、リクエストの組み立て、ページ送り、結果 JSON の取得を担う。
/// トランスポートのリトライは `TranscribeService` 実装側の責務。
pub struct TranscriptionClient {
    service: Arc<dyn TranscribeService>,
    loader: Arc<dyn TranscriptLoader>,
    storage: StorageConfig,
    options: SubmitOptions,
    metrics: Arc<Metrics>,
}

impl TranscriptionClient {
    pub fn new(
        service: Arc<dyn TranscribeService>,
        loader: Arc<dyn TranscriptLoader>,
        storage: StorageConfig,
        options: SubmitOptions,
    ) -> Self {
        Self {
            service,
            loader,
            storage,
            options,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// StartJob リクエストを組み立てる。リモート呼び出し前の検証もここで行う。
    pub fn build_request(
        &self,
        language: &str,
        source_path: &str,
        run_id: &RunId,
    ) -> Result<StartJobRequest, TranscribeError> {
        if source_path.is_empty() {
            return Err(TranscribeError::Parameter(
                "Source path must not be empty".to_string(),
            ));
        }
        let language = if language == AUTO_LANGUAGE {
            LanguageSelection::Identify
        } else if language::is_supported_language(language) {
            LanguageSelection::Code(language.to_string())
        } else {
            return Err(TranscribeError::Parameter(format!(
                "Invalid language code: {language}"
            )));
        };

        Ok(StartJobRequest {
            job_name: run_id.new_job_name(),
            media_uri: self.storage.media_uri(source_path),
            output_bucket: self.storage.output_bucket().to_string(),
            output_key: self.storage.response_prefix(),
            language,
            max_speaker_labels: self.options.max_speaker_labels,
            redaction: self.options.pii_types.as_ref().map(|types| PiiRedaction {
                entity_types: types.clone(),
            }),
        })
    }

    /// ジョブを1件投入する。サービスが返したジョブ名が送信したものと一致しなければ
    /// `ResponseFormat` エラー。
    pub async fn submit(
        &self,
        language: &str,
        source_path: &str,
        run_id: &RunId,
    ) -> Result<Job, TranscribeError> {
        let request = self.build_request(language, source_path, run_id)?;

        let started = Instant::now();
        let echoed = self.service.start_job(&request).await;
        self.metrics
            .record_latency("submit", started.elapsed().as_millis() as u64);
        let echoed = echoed.inspect_err(|e| {
            log::error!("Error happened when submitting {source_path}: {e}");
        })?;

        if echoed != request.job_name {
            return Err(TranscribeError::ResponseFormat(format!(
                "submitted job {} but the service answered with {}",
                request.job_name, echoed
            )));
        }

        log::info!("Transcription job {} submitted for {}", echoed, source_path);
        self.metrics.inc_jobs_submitted();
        Ok(Job {
            job_name: echoed,
            source_path: source_path.to_string(),
            language: language.to_string(),
        })
    }

    /// 名前に `name_contains` を含むジョブを全ページ分取得する。
    /// 順序はサービスの返却順のまま。いずれかのページが失敗したら全体を `List` エラーにする。
    pub async fn list_jobs(
        &self,
        name_contains: &str,
        status: Option<JobStatus>,
    ) -> Result<Vec<JobStatusRecord>, TranscribeError> {
        let query = ListJobsQuery {
            name_contains: name_contains.to_string(),
            status,
        };

        let started = Instant::now();
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        let mut page = 0usize;
        loop {
            let result = self
                .service
                .list_jobs_page(&query, next_token.take())
                .await
                .map_err(|e| {
                    let detail = match e {
                        TranscribeError::List(msg) => msg,
                        other => other.to_string(),
                    };
                    TranscribeError::List(format!(
                        "exception raised when trying to reach page {page} of the job list: {detail}"
                    ))
                })?;

            records.extend(result.jobs);
            page += 1;
            match result.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        self.metrics
            .record_latency("list", started.elapsed().as_millis() as u64);
        log::debug!(
            "Listed {} jobs matching {} ({} pages, status {:?})",
            records.len(),
            query.name_contains,
            page,
            query.status
        );
        Ok(records)
    }

    /// 完了ジョブの結果 JSON を取得する
    pub async fn fetch_transcript(
        &self,
        job_name: &str,
    ) -> Result<serde_json::Value, TranscribeError> {
        let name = if self.options.pii_types.is_some() {
            format!("{REDACTED_PREFIX}{job_name}")
        } else {
            job_name.to_string()
        };

        let started = Instant::now();
        let payload = self.loader.load(&name).await;
        self.metrics
            .record_latency("fetch", started.elapsed().as_millis() as u64);
        payload
    }
}
