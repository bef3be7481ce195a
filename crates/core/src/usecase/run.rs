use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::error::TranscribeError;
use crate::domain::job::RunId;
use crate::domain::language::SUPPORTED_AUDIO_FORMATS;
use crate::domain::settings::RunConfig;
use crate::infra::clock::Clock;
use crate::infra::metrics::MetricsSummary;
use crate::infra::output::RowSink;
use crate::infra::storage::PathLister;
use crate::usecase::client::TranscriptionClient;
use crate::usecase::submitter::BatchSubmitter;
use crate::usecase::tracker::JobTracker;

/// 1回分のバッチ実行: 入力列挙 → 投入 → 追跡 → 行の書き出し
pub struct TranscribeRun {
    lister: Arc<dyn PathLister>,
    client: Arc<TranscriptionClient>,
    clock: Arc<dyn Clock>,
    config: RunConfig,
    cancel: CancellationToken,
}

impl TranscribeRun {
    /// 設定はここで検証する。不正なら何も呼び出さずに `Parameter` エラー。
    pub fn new(
        lister: Arc<dyn PathLister>,
        client: Arc<TranscriptionClient>,
        clock: Arc<dyn Clock>,
        config: RunConfig,
        cancel: CancellationToken,
    ) -> Result<Self, TranscribeError> {
        config.validate()?;
        Ok(Self {
            lister,
            client,
            clock,
            config,
            cancel,
        })
    }

    pub async fn execute(
        &self,
        run_id: &RunId,
        sink: &mut dyn RowSink,
    ) -> Result<MetricsSummary, TranscribeError> {
        let paths = self.lister.list_paths(SUPPORTED_AUDIO_FORMATS).await?;
        log::info!("Run {}: {} audio files found", run_id, paths.len());

        let submitter = BatchSubmitter::new(self.client.clone(), self.clock.clone(), &self.config);
        let submitted = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(TranscribeError::Cancelled),
            submitted = submitter.submit_all(&paths, run_id) => submitted?,
        };

        let tracker = JobTracker::new(
            self.client.clone(),
            self.clock.clone(),
            &self.config,
            self.cancel.clone(),
        );
        let rows = tracker.track(&submitted, run_id).await?;

        sink.write_rows(&rows).inspect_err(|e| {
            self.client.metrics().inc_error(e.code());
        })?;

        let summary = self.client.metrics().summary();
        log::info!(
            "Run {} finished: {} completed, {} failed, {} timed out, {} malformed, {} submission errors, {} poll cycles",
            run_id,
            summary.jobs_completed,
            summary.jobs_failed,
            summary.jobs_timed_out,
            summary.jobs_malformed,
            summary.submission_errors,
            summary.poll_cycles
        );
        Ok(summary)
    }
}
