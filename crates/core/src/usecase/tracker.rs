use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use tokio_util::sync::CancellationToken;

use crate::domain::error::TranscribeError;
use crate::domain::job::{JobStatus, JobStatusRecord, RunId, SubmittedJob};
use crate::domain::settings::{ListMode, RunConfig};
use crate::domain::types::{OutputErrorType, ResultRow, JOB_TIMEOUT_ERROR_MESSAGE};
use crate::infra::clock::Clock;
use crate::usecase::assembler::{self, AssembleOptions};
use crate::usecase::client::TranscriptionClient;

/// 投入済みジョブが全て確定するまでポーリングするトラッカー。
///
/// 確定した行は二度と書き換えない。タイムアウトで確定したジョブは
/// 以後サービスが完了を報告しても無視する。
/// 一覧に現れない、または作成時刻のないジョブのタイムアウトは投入時刻から測る。
pub struct JobTracker {
    client: Arc<TranscriptionClient>,
    clock: Arc<dyn Clock>,
    options: AssembleOptions,
    poll_interval: Duration,
    list_mode: ListMode,
    cancel: CancellationToken,
}

impl JobTracker {
    pub fn new(
        client: Arc<TranscriptionClient>,
        clock: Arc<dyn Clock>,
        config: &RunConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            clock,
            options: AssembleOptions {
                display_json: config.display_json,
                timeout: config.job_timeout(),
            },
            poll_interval: config.poll_interval(),
            list_mode: config.list_mode,
            cancel,
        }
    }

    /// 全ジョブの結果行を投入順で返す。
    ///
    /// 投入時点で失敗していた行はそのまま失敗行として通す。
    /// 一覧取得の失敗・未知のステータス・結果 JSON の取得失敗は実行全体のエラー。
    /// 結果 JSON の形式不正はそのジョブだけの失敗行になる。
    pub async fn track(
        &self,
        submitted: &[SubmittedJob],
        run_id: &RunId,
    ) -> Result<Vec<ResultRow>, TranscribeError> {
        let mut pending: HashMap<&str, &SubmittedJob> = submitted
            .iter()
            .filter(|job| job.is_pending())
            .map(|job| (job.job_name.as_str(), job))
            .collect();
        let mut resolved: HashMap<String, ResultRow> = HashMap::with_capacity(pending.len());
        let metrics = self.client.metrics();

        log::info!(
            "Tracking {} jobs for run {} ({} failed at submission)",
            pending.len(),
            run_id,
            submitted.len() - pending.len()
        );

        let mut cycle = 0u64;
        while !pending.is_empty() {
            if self.cancel.is_cancelled() {
                return Err(TranscribeError::Cancelled);
            }
            cycle += 1;
            metrics.inc_poll_cycles();

            let records = self.poll(run_id).await?;
            let now = self.clock.now();

            for record in &records {
                let Some(job) = pending.get(record.job_name.as_str()).copied() else {
                    continue;
                };
                let row = match assembler::assemble(&job.path, record, &self.client, &self.options, now)
                    .await
                {
                    Ok(Some(row)) => row,
                    Ok(None) => continue,
                    Err(TranscribeError::ResponseFormat(message)) => ResultRow::failure(
                        &job.path,
                        &job.job_name,
                        OutputErrorType::ResponseFormat,
                        message,
                    ),
                    Err(e) => {
                        metrics.inc_error(e.code());
                        return Err(e);
                    }
                };
                metrics.record_row(&row);
                pending.remove(record.job_name.as_str());
                resolved.insert(record.job_name.clone(), row);
            }

            if let Some(timeout) = self.options.timeout {
                let dated: HashSet<&str> = records
                    .iter()
                    .filter(|r| r.created_at.is_some())
                    .map(|r| r.job_name.as_str())
                    .collect();
                let expired: Vec<&SubmittedJob> = pending
                    .iter()
                    .filter(|(name, _)| !dated.contains(*name))
                    .filter_map(|(_, job)| {
                        job.submitted_at
                            .filter(|at| now - *at > timeout)
                            .map(|_| *job)
                    })
                    .collect();
                for job in expired {
                    log::warn!(
                        "Job {} not reported by the service after a timeout of {} minutes",
                        job.job_name,
                        timeout.num_minutes()
                    );
                    let row = ResultRow::failure(
                        &job.path,
                        &job.job_name,
                        OutputErrorType::JobTimeout,
                        JOB_TIMEOUT_ERROR_MESSAGE,
                    );
                    metrics.record_row(&row);
                    pending.remove(job.job_name.as_str());
                    resolved.insert(job.job_name.clone(), row);
                }
            }

            if pending.is_empty() {
                break;
            }
            log::info!(
                "Poll cycle {}: {} resolved, {} pending",
                cycle,
                resolved.len(),
                pending.len()
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    log::warn!("Tracking of run {} cancelled with {} jobs pending", run_id, pending.len());
                    return Err(TranscribeError::Cancelled);
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        log::info!("All {} jobs of run {} resolved after {} poll cycles", resolved.len(), run_id, cycle);

        submitted
            .iter()
            .map(|job| match &job.error {
                Some(error) => {
                    let row = ResultRow::from_prior_error(&job.path, &job.job_name, error);
                    metrics.record_row(&row);
                    Ok(row)
                }
                None => resolved.remove(&job.job_name).ok_or_else(|| {
                    TranscribeError::ResponseFormat(format!(
                        "no result recorded for job {}",
                        job.job_name
                    ))
                }),
            })
            .map(|row| row.map(|r| r.with_json_column(self.options.display_json)))
            .collect()
    }

    /// 1回分の一覧取得。ステータス別モードでは全問い合わせの完了後にまとめて返す。
    async fn poll(&self, run_id: &RunId) -> Result<Vec<JobStatusRecord>, TranscribeError> {
        let result = match self.list_mode {
            ListMode::Single => self.client.list_jobs(run_id.as_str(), None).await,
            ListMode::PerStatus => try_join_all(
                JobStatus::KNOWN
                    .iter()
                    .map(|status| self.client.list_jobs(run_id.as_str(), Some(status.clone()))),
            )
            .await
            .map(|pages| pages.into_iter().flatten().collect()),
        };
        result.inspect_err(|e| {
            self.client.metrics().inc_error(e.code());
            log::error!("{e}");
        })
    }
}
