use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::OutputErrorType;

/// 言語自動判定を表すセンチネル
pub const AUTO_LANGUAGE: &str = "auto";

// ─── RunId ───────────────────────────────────────────────────────

/// 1回の実行を識別するID。ジョブ名のプレフィックス兼一覧取得のフィルタ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// `{label}_{uuid}` 形式のIDを生成する
    pub fn generate(label: &str) -> Self {
        let label = if label.is_empty() { "run" } else { label };
        Self(format!("{}_{}", label, uuid::Uuid::new_v4().simple()))
    }

    /// 既存のIDをそのまま使う（テスト・再実行用）
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// この実行に属する一意なジョブ名を生成する。
    /// UUID v4 の衝突確率はバッチサイズに対して無視できる。
    pub fn new_job_name(&self) -> String {
        format!("{}_{}", self.0, uuid::Uuid::new_v4().simple())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Job ─────────────────────────────────────────────────────────

/// 投入済みの書き起こしジョブ。生成後は不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_name: String,
    pub source_path: String,
    /// 言語コード、または "auto"
    pub language: String,
}

/// 投入時点で失敗した行のエラー情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorError {
    pub error_type: OutputErrorType,
    pub message: String,
}

/// Submitter から Tracker へ渡す1行分の投入結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub path: String,
    /// 投入に失敗した行では空
    pub job_name: String,
    /// 投入が受理された時刻。一覧に現れないジョブのタイムアウト起点
    pub submitted_at: Option<DateTime<Utc>>,
    pub error: Option<PriorError>,
}

impl SubmittedJob {
    pub fn submitted(job: &Job, at: DateTime<Utc>) -> Self {
        Self {
            path: job.source_path.clone(),
            job_name: job.job_name.clone(),
            submitted_at: Some(at),
            error: None,
        }
    }

    pub fn failed(path: impl Into<String>, error: PriorError) -> Self {
        Self {
            path: path.into(),
            job_name: String::new(),
            submitted_at: None,
            error: Some(error),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.error.is_none()
    }
}

// ─── JobStatus ───────────────────────────────────────────────────

/// サービスが報告するジョブ状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// 列挙外の値（そのまま保持してエラー報告に使う）
    Unknown(String),
}

impl JobStatus {
    /// 一覧取得時にステータスで分割問い合わせする場合の全状態
    pub const KNOWN: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn from_service(raw: &str) -> Self {
        match raw {
            "QUEUED" => Self::Queued,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── JobStatusRecord ─────────────────────────────────────────────

/// 一覧取得で得られるジョブのスナップショット。ポーリング1回ごとに使い捨て。
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusRecord {
    pub job_name: String,
    pub status: JobStatus,
    /// 解決済みの言語コード（auto の場合は判定後に入る）
    pub language_code: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// FAILED の場合のみ
    pub failure_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_name_has_run_prefix() {
        let run = RunId::from_raw("job42_abc");
        let name = run.new_job_name();
        assert!(name.starts_with("job42_abc_"));
        assert_eq!(name.len(), "job42_abc_".len() + 32);
    }

    #[test]
    fn test_job_names_are_unique() {
        let run = RunId::generate("batch");
        let names: std::collections::HashSet<String> =
            (0..1000).map(|_| run.new_job_name()).collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_run_id_default_label() {
        let run = RunId::generate("");
        assert!(run.as_str().starts_with("run_"));
    }

    #[test]
    fn test_status_from_service() {
        assert_eq!(JobStatus::from_service("QUEUED"), JobStatus::Queued);
        assert_eq!(JobStatus::from_service("IN_PROGRESS"), JobStatus::InProgress);
        assert_eq!(JobStatus::from_service("COMPLETED"), JobStatus::Completed);
        assert_eq!(JobStatus::from_service("FAILED"), JobStatus::Failed);
        assert_eq!(
            JobStatus::from_service("PAUSED"),
            JobStatus::Unknown("PAUSED".to_string())
        );
        assert_eq!(JobStatus::Unknown("PAUSED".into()).as_str(), "PAUSED");
    }

    #[test]
    fn test_pending_statuses() {
        assert!(JobStatus::Queued.is_pending());
        assert!(JobStatus::InProgress.is_pending());
        assert!(!JobStatus::Completed.is_pending());
        assert!(!JobStatus::Failed.is_pending());
    }

    #[test]
    fn test_submitted_job_constructors() {
        let job = Job {
            job_name: "r_1".into(),
            source_path: "/a.mp3".into(),
            language: AUTO_LANGUAGE.into(),
        };
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let ok = SubmittedJob::submitted(&job, at);
        assert!(ok.is_pending());
        assert_eq!(ok.job_name, "r_1");
        assert_eq!(ok.submitted_at, Some(at));

        let failed = SubmittedJob::failed(
            "/b.mp3",
            PriorError {
                error_type: OutputErrorType::Submission,
                message: "boom".into(),
            },
        );
        assert!(!failed.is_pending());
        assert!(failed.job_name.is_empty());
        assert!(failed.submitted_at.is_none());
    }
}
