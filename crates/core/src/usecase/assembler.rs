//! ジョブ状態レコードから出力行を組み立てる。
//!
//! 判定（`classify`）は (レコード, 現在時刻, タイムアウト) だけで決まる純関数。
//! 完了ジョブのみ結果 JSON を取得して行を完成させる。

use chrono::{DateTime, Utc};

use crate::domain::error::TranscribeError;
use crate::domain::job::{JobStatus, JobStatusRecord};
use crate::domain::language;
use crate::domain::types::{OutputErrorType, ResultRow, JOB_TIMEOUT_ERROR_MESSAGE};
use crate::usecase::client::TranscriptionClient;

/// 行の組み立てオプション
#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    /// 生の結果 JSON を行に含めるか
    pub display_json: bool,
    /// None ならタイムアウトしない
    pub timeout: Option<chrono::Duration>,
}

/// 1レコードの判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// まだ処理中（行は作らない）
    Pending,
    /// ローカルタイムアウト
    TimedOut,
    /// 完了（結果 JSON の取得が必要）
    Completed,
    /// サービス側の失敗
    Failed(String),
}

/// レコードを分類する。列挙外のステータスは `UnknownStatus` エラー。
pub fn classify(
    record: &JobStatusRecord,
    now: DateTime<Utc>,
    timeout: Option<chrono::Duration>,
) -> Result<Classification, TranscribeError> {
    match &record.status {
        JobStatus::Queued | JobStatus::InProgress => {
            let elapsed = record.created_at.map(|created| now - created);
            if let Some(elapsed) = elapsed {
                log::info!(
                    "{} | {} | {} min",
                    record.status,
                    record.job_name,
                    elapsed.num_minutes()
                );
            }
            match (timeout, elapsed) {
                (Some(timeout), Some(elapsed)) if elapsed > timeout => {
                    log::warn!(
                        "Job {} canceled after a timeout of {} minutes",
                        record.job_name,
                        timeout.num_minutes()
                    );
                    Ok(Classification::TimedOut)
                }
                _ => Ok(Classification::Pending),
            }
        }
        JobStatus::Completed => Ok(Classification::Completed),
        JobStatus::Failed => Ok(Classification::Failed(
            record.failure_reason.clone().unwrap_or_default(),
        )),
        JobStatus::Unknown(raw) => {
            log::warn!("Unknown state encountered for {}: {}", record.job_name, raw);
            Err(TranscribeError::UnknownStatus(raw.clone()))
        }
    }
}

/// 完了ジョブの結果 JSON から成功行を作る。形式が壊れていれば `ResponseFormat`。
pub fn completed_row(
    path: &str,
    record: &JobStatusRecord,
    payload: serde_json::Value,
    display_json: bool,
) -> Result<ResultRow, TranscribeError> {
    let transcript = payload
        .pointer("/results/transcripts/0/transcript")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            let message = format!(
                "missing results.transcripts[0].transcript in the result of job {}",
                record.job_name
            );
            log::error!("Badly formed response: {message}");
            TranscribeError::ResponseFormat(message)
        })?
        .to_string();

    let language_code = record.language_code.clone().unwrap_or_default();
    let language = language::display_name(&language_code)
        .unwrap_or_default()
        .to_string();

    Ok(ResultRow {
        transcript,
        language_code,
        language,
        json: display_json.then_some(payload),
        ..ResultRow::empty(path, &record.job_name)
    })
}

/// 判定結果から行を作る。`Pending` なら None、`Completed` なら結果 JSON を取得する。
pub async fn assemble(
    path: &str,
    record: &JobStatusRecord,
    client: &TranscriptionClient,
    options: &AssembleOptions,
    now: DateTime<Utc>,
) -> Result<Option<ResultRow>, TranscribeError> {
    let row = match classify(record, now, options.timeout)? {
        Classification::Pending => return Ok(None),
        Classification::TimedOut => ResultRow::failure(
            path,
            &record.job_name,
            OutputErrorType::JobTimeout,
            JOB_TIMEOUT_ERROR_MESSAGE,
        ),
        Classification::Completed => {
            let payload = client.fetch_transcript(&record.job_name).await?;
            let row = completed_row(path, record, payload, options.display_json)?;
            log::info!("Transcription job {} completed with success.", record.job_name);
            row
        }
        Classification::Failed(reason) => {
            log::error!(
                "Transcription job {} failed. Failure reason: {}",
                record.job_name,
                reason
            );
            ResultRow::failure(path, &record.job_name, OutputErrorType::AwsFailure, reason)
        }
    };
    Ok(Some(row))
}
