pub mod aws;

pub use aws::AwsTranscribeService;

use async_trait::async_trait;

use crate::domain::error::TranscribeError;
use crate::domain::job::{JobStatus, JobStatusRecord};

/// 一覧取得の1ページあたりの最大件数
pub const LIST_PAGE_SIZE: i32 = 100;

/// 言語指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelection {
    /// 言語自動判定（言語コードは送らない）
    Identify,
    Code(String),
}

/// PII 秘匿化の指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiRedaction {
    pub entity_types: Vec<String>,
}

/// StartJob に渡すリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartJobRequest {
    pub job_name: String,
    pub media_uri: String,
    pub output_bucket: String,
    pub output_key: String,
    pub language: LanguageSelection,
    pub max_speaker_labels: Option<u32>,
    pub redaction: Option<PiiRedaction>,
}

/// ListJobs の問い合わせ条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListJobsQuery {
    pub name_contains: String,
    pub status: Option<JobStatus>,
}

/// ListJobs の1ページ
#[derive(Debug, Clone, Default)]
pub struct JobPage {
    pub jobs: Vec<JobStatusRecord>,
    pub next_token: Option<String>,
}

/// 書き起こしサービスの境界。
///
/// 実装はトランスポート・認証・リトライを内部で扱い、
/// ページ送りや結果の組み立ては呼び出し側（`TranscriptionClient`）が行う。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscribeService: Send + Sync {
    /// ジョブを1件開始し、サービスが返したジョブ名を返す。
    async fn start_job(&self, request: &StartJobRequest) -> Result<String, TranscribeError>;

    /// ジョブ一覧を1ページ取得する。
    async fn list_jobs_page(
        &self,
        query: &ListJobsQuery,
        next_token: Option<String>,
    ) -> Result<JobPage, TranscribeError>;
}
