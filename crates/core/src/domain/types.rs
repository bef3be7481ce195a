use serde::{Deserialize, Serialize};

use crate::domain::job::PriorError;

/// タイムアウト時に出力する固定メッセージ
pub const JOB_TIMEOUT_ERROR_MESSAGE: &str = "The job duration lasted more than the timeout.";

/// 出力行のエラー種別。空文字列は成功を表す。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputErrorType {
    #[default]
    #[serde(rename = "")]
    None,
    /// サービス側が FAILED を報告
    #[serde(rename = "AWS_FAILURE")]
    AwsFailure,
    /// ローカルで判定したタイムアウト
    #[serde(rename = "JOB_TIMEOUT_ERROR")]
    JobTimeout,
    /// 完了済みジョブの結果 JSON が壊れている
    #[serde(rename = "RESPONSE_FORMAT_ERROR")]
    ResponseFormat,
    /// 投入自体が失敗（ErrorHandling::Log のときのみ）
    #[serde(rename = "SUBMISSION_ERROR")]
    Submission,
}

impl OutputErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::AwsFailure => "AWS_FAILURE",
            Self::JobTimeout => "JOB_TIMEOUT_ERROR",
            Self::ResponseFormat => "RESPONSE_FORMAT_ERROR",
            Self::Submission => "SUBMISSION_ERROR",
        }
    }
}

/// 出力テーブルの1行。ジョブ1件につきちょうど1行。
///
/// フィールド順がそのまま出力列順になる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub path: String,
    pub job_name: String,
    pub transcript: String,
    pub language_code: String,
    pub language: String,
    pub output_error_type: OutputErrorType,
    pub output_error_message: String,
    /// 生の結果 JSON。display_json 無効時は列ごと省略する
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
}

impl ResultRow {
    /// 空の行（全列が空文字列）
    pub fn empty(path: &str, job_name: &str) -> Self {
        Self {
            path: path.to_string(),
            job_name: job_name.to_string(),
            transcript: String::new(),
            language_code: String::new(),
            language: String::new(),
            output_error_type: OutputErrorType::None,
            output_error_message: String::new(),
            json: None,
        }
    }

    pub fn failure(
        path: &str,
        job_name: &str,
        error_type: OutputErrorType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            output_error_type: error_type,
            output_error_message: message.into(),
            ..Self::empty(path, job_name)
        }
    }

    /// 投入時点で失敗していた行をそのまま出力行にする
    pub fn from_prior_error(path: &str, job_name: &str, error: &PriorError) -> Self {
        Self::failure(path, job_name, error.error_type, error.message.clone())
    }

    pub fn is_success(&self) -> bool {
        self.output_error_type == OutputErrorType::None
    }

    /// display_json 有効時は全行に `json` 列を持たせる（結果 JSON のない行は空文字列）
    pub fn with_json_column(mut self, display_json: bool) -> Self {
        if display_json && self.json.is_none() {
            self.json = Some(serde_json::Value::String(String::new()));
        }
        self
    }
}

/// 出力列の説明
pub const COLUMN_DESCRIPTIONS: [(&str, &str); 8] = [
    ("path", "Path to the audio file in the S3 bucket."),
    ("job_name", "Name to identify the job in Amazon Transcribe."),
    ("transcript", "Transcript of the audio file."),
    ("language_code", "Language code detected or setup by the user."),
    ("language", "Language detected or setup by the user."),
    ("output_error_type", "The error type in case an error occurs."),
    ("output_error_message", "The error message in case an error occurs."),
    ("json", "Raw API response in JSON form."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_row_is_not_success() {
        let row = ResultRow::failure("/a.mp3", "r_1", OutputErrorType::AwsFailure, "bad");
        assert!(!row.is_success());
        assert!(row.transcript.is_empty());
        assert_eq!(row.output_error_message, "bad");
    }

    #[test]
    fn test_prior_error_passes_type_through() {
        for error_type in [OutputErrorType::Submission, OutputErrorType::ResponseFormat] {
            let row = ResultRow::from_prior_error(
                "/a.mp3",
                "",
                &PriorError {
                    error_type,
                    message: "throttled".into(),
                },
            );
            assert_eq!(row.output_error_type, error_type);
            assert_eq!(row.output_error_message, "throttled");
        }
    }

    #[test]
    fn test_error_type_strings_match_wire_format() {
        for t in [
            OutputErrorType::None,
            OutputErrorType::AwsFailure,
            OutputErrorType::JobTimeout,
            OutputErrorType::ResponseFormat,
            OutputErrorType::Submission,
        ] {
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
    }

    #[test]
    fn test_json_column_filled_only_when_enabled() {
        let failed = ResultRow::failure("/a.mp3", "r_1", OutputErrorType::AwsFailure, "bad");
        assert_eq!(failed.clone().with_json_column(false).json, None);
        assert_eq!(
            failed.with_json_column(true).json,
            Some(serde_json::Value::String(String::new()))
        );

        let payload = serde_json::json!({"results": {}});
        let completed = ResultRow {
            json: Some(payload.clone()),
            ..ResultRow::empty("/b.mp3", "r_2")
        };
        assert_eq!(completed.with_json_column(true).json, Some(payload));
    }
}
