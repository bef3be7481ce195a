use serde::Serialize;
use std::sync::Mutex;

use crate::domain::types::{OutputErrorType, ResultRow};

/// 保持するレイテンシ記録の上限
const MAX_LATENCY_RECORDS: usize = 1000;

/// 実行中のローカルメトリクス収集器
pub struct Metrics {
    counters: Mutex<MetricsCounters>,
    latencies: Mutex<Vec<LatencyRecord>>,
}

#[derive(Debug, Default)]
struct MetricsCounters {
    jobs_submitted: u64,
    jobs_completed: u64,
    jobs_failed: u64,
    jobs_timed_out: u64,
    jobs_malformed: u64,
    submission_errors: u64,
    poll_cycles: u64,
    errors_by_code: Vec<(String, u64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyRecord {
    pub phase: String,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// 実行終了時に出力するサマリー
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub jobs_submitted: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub jobs_timed_out: u64,
    pub jobs_malformed: u64,
    pub submission_errors: u64,
    pub poll_cycles: u64,
    pub errors: Vec<(String, u64)>,
    pub avg_latency_ms: AvgLatency,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvgLatency {
    pub submit: Option<f64>,
    pub list: Option<f64>,
    pub fetch: Option<f64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(MetricsCounters::default()),
            latencies: Mutex::new(Vec::new()),
        }
    }

    fn with_counters(&self, f: impl FnOnce(&mut MetricsCounters)) {
        // 他スレッドの panic で poison されていても集計は続ける
        let mut c = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut c);
    }

    pub fn inc_jobs_submitted(&self) {
        self.with_counters(|c| c.jobs_submitted += 1);
    }

    pub fn inc_poll_cycles(&self) {
        self.with_counters(|c| c.poll_cycles += 1);
    }

    /// 確定した行を種別ごとに数える
    pub fn record_row(&self, row: &ResultRow) {
        self.with_counters(|c| match row.output_error_type {
            OutputErrorType::None => c.jobs_completed += 1,
            OutputErrorType::AwsFailure => c.jobs_failed += 1,
            OutputErrorType::JobTimeout => c.jobs_timed_out += 1,
            OutputErrorType::ResponseFormat => c.jobs_malformed += 1,
            OutputErrorType::Submission => c.submission_errors += 1,
        });
    }

    pub fn inc_error(&self, code: &str) {
        self.with_counters(|c| {
            match c.errors_by_code.iter_mut().find(|(k, _)| k == code) {
                Some((_, n)) => *n += 1,
                None => c.errors_by_code.push((code.to_string(), 1)),
            }
        });
    }

    pub fn record_latency(&self, phase: &str, duration_ms: u64) {
        let record = LatencyRecord {
            phase: phase.to_string(),
            duration_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let mut latencies = self.latencies.lock().unwrap_or_else(|e| e.into_inner());
        latencies.push(record);
        if latencies.len() > MAX_LATENCY_RECORDS {
            let excess = latencies.len() - MAX_LATENCY_RECORDS;
            latencies.drain(0..excess);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let c = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let latencies = self.latencies.lock().unwrap_or_else(|e| e.into_inner());

        let avg = |phase: &str| -> Option<f64> {
            let vals: Vec<f64> = latencies
                .iter()
                .filter(|r| r.phase == phase)
                .map(|r| r.duration_ms as f64)
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.iter().sum::<f64>() / vals.len() as f64)
            }
        };

        MetricsSummary {
            jobs_submitted: c.jobs_submitted,
            jobs_completed: c.jobs_completed,
            jobs_failed: c.jobs_failed,
            jobs_timed_out: c.jobs_timed_out,
            jobs_malformed: c.jobs_malformed,
            submission_errors: c.submission_errors,
            poll_cycles: c.poll_cycles,
            errors: c.errors_by_code.clone(),
            avg_latency_ms: AvgLatency {
                submit: avg("submit"),
                list: avg("list"),
                fetch: avg("fetch"),
            },
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
