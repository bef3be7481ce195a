use std::sync::Arc;

use futures_util::stream::{self, StreamExt};

use crate::domain::error::TranscribeError;
use crate::domain::job::{PriorError, RunId, SubmittedJob};
use crate::domain::settings::{ErrorHandling, RunConfig, MAX_PARALLEL_WORKERS};
use crate::domain::types::OutputErrorType;
use crate::infra::clock::Clock;
use crate::usecase::client::TranscriptionClient;

/// 入力パスごとに1ジョブを投入するワーカープール。
///
/// 同時実行数は `parallel_workers` まで。結果は入力順で返す。
/// 受理されたジョブには受理時刻を記録する。
pub struct BatchSubmitter {
    client: Arc<TranscriptionClient>,
    clock: Arc<dyn Clock>,
    language: String,
    workers: usize,
    error_handling: ErrorHandling,
}

impl BatchSubmitter {
    pub fn new(client: Arc<TranscriptionClient>, clock: Arc<dyn Clock>, config: &RunConfig) -> Self {
        Self {
            client,
            clock,
            language: config.language.clone(),
            workers: config.parallel_workers.clamp(1, MAX_PARALLEL_WORKERS),
            error_handling: config.error_handling,
        }
    }

    pub async fn submit_all(
        &self,
        paths: &[String],
        run_id: &RunId,
    ) -> Result<Vec<SubmittedJob>, TranscribeError> {
        log::info!(
            "Submitting {} files with {} workers (run {})",
            paths.len(),
            self.workers,
            run_id
        );

        let mut slots: Vec<Option<SubmittedJob>> = vec![None; paths.len()];
        let mut results = stream::iter(paths.iter().enumerate())
            .map(|(index, path)| async move {
                (index, self.client.submit(&self.language, path, run_id).await)
            })
            .buffer_unordered(self.workers);

        while let Some((index, result)) = results.next().await {
            let path = &paths[index];
            let submitted = match result {
                Ok(job) => SubmittedJob::submitted(&job, self.clock.now()),
                Err(e) => {
                    self.client.metrics().inc_error(e.code());
                    match (&e, self.error_handling) {
                        (TranscribeError::Submission(message), ErrorHandling::Log) => {
                            log::warn!("Submission of {path} failed, recorded in its row: {message}");
                            SubmittedJob::failed(
                                path.as_str(),
                                PriorError {
                                    error_type: OutputErrorType::Submission,
                                    message: e.to_string(),
                                },
                            )
                        }
                        _ => return Err(e),
                    }
                }
            };
            slots[index] = Some(submitted);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
