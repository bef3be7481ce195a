use async_trait::async_trait;
use aws_sdk_transcribe::error::{DisplayErrorContext, SdkError};
use aws_sdk_transcribe::primitives::DateTime as AwsDateTime;
use aws_sdk_transcribe::types::{
    ContentRedaction, LanguageCode, Media, PiiEntityType, RedactionOutput, RedactionType,
    Settings, TranscriptionJobStatus, TranscriptionJobSummary,
};
use chrono::{DateTime, Utc};

use super::{
    JobPage, LanguageSelection, ListJobsQuery, StartJobRequest, TranscribeService,
    LIST_PAGE_SIZE,
};
use crate::domain::error::TranscribeError;
use crate::domain::job::{JobStatus, JobStatusRecord};

/// Amazon Transcribe (AWS SDK) を使ったサービス実装
pub struct AwsTranscribeService {
    client: aws_sdk_transcribe::Client,
}

impl AwsTranscribeService {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_transcribe::Client::new(config),
        }
    }
}

#[async_trait]
impl TranscribeService for AwsTranscribeService {
    async fn start_job(&self, request: &StartJobRequest) -> Result<String, TranscribeError> {
        let mut call = self
            .client
            .start_transcription_job()
            .transcription_job_name(&request.job_name)
            .media(Media::builder().media_file_uri(&request.media_uri).build())
            .output_bucket_name(&request.output_bucket)
            .output_key(&request.output_key);

        call = match &request.language {
            LanguageSelection::Identify => call.identify_language(true),
            LanguageSelection::Code(code) => call.language_code(LanguageCode::from(code.as_str())),
        };

        if let Some(max_speakers) = request.max_speaker_labels {
            call = call.settings(
                Settings::builder()
                    .show_speaker_labels(true)
                    .max_speaker_labels(i32::try_from(max_speakers).unwrap_or(i32::MAX))
                    .build(),
            );
        }

        if let Some(redaction) = &request.redaction {
            let entity_types = redaction
                .entity_types
                .iter()
                .map(|t| PiiEntityType::from(t.as_str()))
                .collect();
            let content_redaction = ContentRedaction::builder()
                .redaction_type(RedactionType::Pii)
                .redaction_output(RedactionOutput::Redacted)
                .set_pii_entity_types(Some(entity_types))
                .build()
                .map_err(|e| {
                    TranscribeError::Parameter(format!("Invalid PII redaction settings: {e}"))
                })?;
            call = call.content_redaction(content_redaction);
        }

        log::debug!("StartTranscriptionJob request: {:?}", request);

        let output = call.send().await.map_err(|e| match &e {
            SdkError::ConstructionFailure(_) => TranscribeError::Parameter(format!(
                "The parameters you provided are incorrect: {}",
                DisplayErrorContext(&e)
            )),
            _ => TranscribeError::Submission(format!(
                "Error happened when starting transcription job {}: {}",
                request.job_name,
                DisplayErrorContext(&e)
            )),
        })?;

        output
            .transcription_job()
            .and_then(|job| job.transcription_job_name())
            .map(str::to_string)
            .ok_or_else(|| {
                TranscribeError::ResponseFormat(
                    "expected TranscriptionJob.TranscriptionJobName in the response".to_string(),
                )
            })
    }

    async fn list_jobs_page(
        &self,
        query: &ListJobsQuery,
        next_token: Option<String>,
    ) -> Result<JobPage, TranscribeError> {
        let output = self
            .client
            .list_transcription_jobs()
            .job_name_contains(&query.name_contains)
            .max_results(LIST_PAGE_SIZE)
            .set_status(
                query
                    .status
                    .as_ref()
                    .map(|s| TranscriptionJobStatus::from(s.as_str())),
            )
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| TranscribeError::List(DisplayErrorContext(&e).to_string()))?;

        let jobs = summaries_to_records(output.transcription_job_summaries(), &query.name_contains)?;

        Ok(JobPage {
            jobs,
            next_token: output.next_token().map(str::to_string),
        })
    }
}

/// 1ページ分のサマリを変換する。
///
/// 名前が欠けている、または `name_contains` を含まないサマリは他の実行のものとして
/// 警告を出して読み飛ばす。この実行のジョブのサマリが不正な場合だけエラーにする。
fn summaries_to_records(
    summaries: &[TranscriptionJobSummary],
    name_contains: &str,
) -> Result<Vec<JobStatusRecord>, TranscribeError> {
    let mut records = Vec::with_capacity(summaries.len());
    for summary in summaries {
        match summary.transcription_job_name() {
            Some(name) if name.contains(name_contains) => records.push(summary_to_record(summary)?),
            Some(name) => match summary_to_record(summary) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping job {name} of another run: {e}"),
            },
            None => log::warn!("Skipping job summary without TranscriptionJobName"),
        }
    }
    Ok(records)
}

/// SDK のジョブサマリをドメインのレコードに変換する
fn summary_to_record(summary: &TranscriptionJobSummary) -> Result<JobStatusRecord, TranscribeError> {
    let job_name = summary.transcription_job_name().ok_or_else(|| {
        TranscribeError::ResponseFormat("job summary without TranscriptionJobName".to_string())
    })?;
    let status = summary
        .transcription_job_status()
        .map(|s| JobStatus::from_service(s.as_str()))
        .ok_or_else(|| {
            TranscribeError::ResponseFormat(format!(
                "job summary {job_name} without TranscriptionJobStatus"
            ))
        })?;

    Ok(JobStatusRecord {
        job_name: job_name.to_string(),
        status,
        language_code: summary.language_code().map(|c| c.as_str().to_string()),
        created_at: summary.creation_time().and_then(to_utc),
        failure_reason: summary.failure_reason().map(str::to_string),
    })
}

fn to_utc(t: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(t.secs(), t.subsec_nanos())
}
