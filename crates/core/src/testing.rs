//! テスト用のフェイク実装。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::error::TranscribeError;
use crate::domain::job::{JobStatus, JobStatusRecord};
use crate::domain::settings::{RunConfig, StorageConfig};
use crate::infra::clock::Clock;
use crate::infra::storage::TranscriptLoader;
use crate::infra::transcribe::{JobPage, ListJobsQuery, StartJobRequest, TranscribeService};
use crate::usecase::client::{SubmitOptions, TranscriptionClient};

pub fn record(job_name: &str, status: JobStatus) -> JobStatusRecord {
    JobStatusRecord {
        job_name: job_name.to_string(),
        status,
        language_code: None,
        created_at: None,
        failure_reason: None,
    }
}

pub fn completed(job_name: &str, language_code: &str) -> JobStatusRecord {
    JobStatusRecord {
        language_code: Some(language_code.to_string()),
        ..record(job_name, JobStatus::Completed)
    }
}

pub fn in_progress_since(job_name: &str, created_at: DateTime<Utc>) -> JobStatusRecord {
    JobStatusRecord {
        created_at: Some(created_at),
        ..record(job_name, JobStatus::InProgress)
    }
}

pub fn transcript_payload(text: &str) -> serde_json::Value {
    serde_json::json!({
        "jobName": "job",
        "results": { "transcripts": [{ "transcript": text }], "items": [] },
        "status": "COMPLETED"
    })
}

/// 名前 → JSON のインメモリローダー。要求された名前を記録する。
#[derive(Default)]
pub struct MemoryTranscriptLoader {
    payloads: Mutex<HashMap<String, serde_json::Value>>,
    requested: Mutex<Vec<String>>,
}

impl MemoryTranscriptLoader {
    pub fn insert(&self, name: &str, payload: serde_json::Value) {
        self.payloads
            .lock()
            .unwrap()
            .insert(name.to_string(), payload);
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptLoader for MemoryTranscriptLoader {
    async fn load(&self, name: &str) -> Result<serde_json::Value, TranscribeError> {
        self.requested.lock().unwrap().push(name.to_string());
        self.payloads
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| TranscribeError::TranscriptLoad(format!("{name} not found")))
    }
}

/// tokio の仮想時間に追従する時計。`start_paused` のテストで時間経過を再現する。
pub struct TokioClock {
    base: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + chrono::Duration::from_std(self.started.elapsed()).unwrap()
    }
}

/// ポーリングごとに用意したスナップショットを返すフェイクサービス。
///
/// スナップショットを使い切った後は最後のものを返し続ける。
/// `start_job` は送られたジョブ名をそのまま返す（`fail_paths` に含まれるパスは失敗）。
#[derive(Default)]
pub struct ScriptedService {
    polls: Mutex<VecDeque<Result<Vec<JobStatusRecord>, TranscribeError>>>,
    last: Mutex<Vec<JobStatusRecord>>,
    pub fail_paths: Vec<String>,
    pub started: Mutex<Vec<StartJobRequest>>,
    list_calls: AtomicUsize,
    pub queries: Mutex<Vec<ListJobsQuery>>,
}

impl ScriptedService {
    /// 指定パスで終わるメディアの投入だけ失敗するサービス
    pub fn failing(paths: &[&str]) -> Self {
        Self {
            fail_paths: paths.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn push_poll(&self, jobs: Vec<JobStatusRecord>) {
        self.polls.lock().unwrap().push_back(Ok(jobs));
    }

    pub fn push_error(&self, error: TranscribeError) {
        self.polls.lock().unwrap().push_back(Err(error));
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn next_snapshot(&self) -> Result<Vec<JobStatusRecord>, TranscribeError> {
        match self.polls.lock().unwrap().pop_front() {
            Some(Ok(jobs)) => {
                *self.last.lock().unwrap() = jobs.clone();
                Ok(jobs)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

#[async_trait]
impl TranscribeService for ScriptedService {
    async fn start_job(&self, request: &StartJobRequest) -> Result<String, TranscribeError> {
        if self
            .fail_paths
            .iter()
            .any(|p| request.media_uri.ends_with(p.as_str()))
        {
            return Err(TranscribeError::Submission(format!(
                "LimitExceededException for {}",
                request.media_uri
            )));
        }
        self.started.lock().unwrap().push(request.clone());
        Ok(request.job_name.clone())
    }

    async fn list_jobs_page(
        &self,
        query: &ListJobsQuery,
        _next_token: Option<String>,
    ) -> Result<JobPage, TranscribeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        // 1回のポーリングで1スナップショット。ステータス別問い合わせ時は該当分だけ返す。
        let jobs = match &query.status {
            None => self.next_snapshot()?,
            Some(status) => {
                let snapshot = if status == &JobStatus::Queued {
                    self.next_snapshot()?
                } else {
                    self.last.lock().unwrap().clone()
                };
                snapshot
                    .into_iter()
                    .filter(|j| &j.status == status)
                    .collect()
            }
        };
        Ok(JobPage {
            jobs,
            next_token: None,
        })
    }
}

pub fn storage() -> StorageConfig {
    StorageConfig {
        input_bucket: "audio-bucket".into(),
        input_root: "in".into(),
        ..Default::default()
    }
}

pub fn client(
    service: Arc<ScriptedService>,
    loader: Arc<MemoryTranscriptLoader>,
) -> TranscriptionClient {
    TranscriptionClient::new(service, loader, storage(), SubmitOptions::default())
}

/// 検証を通る最小の実行設定
pub fn run_config() -> RunConfig {
    RunConfig {
        storage: storage(),
        ..Default::default()
    }
}
