/// 実行全体に関わるエラー。
///
/// ジョブ単位の失敗 (AWS_FAILURE / JOB_TIMEOUT_ERROR など) はエラーではなく
/// `ResultRow` の値として表現する。ここに並ぶのは呼び出し元へ伝播させるものだけ。
#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    /// リモート呼び出し前に判明する設定・リクエストの不備
    #[error("Invalid parameter: {0}")]
    Parameter(String),
    /// ジョブ投入時の通信/サービス障害
    #[error("Transcription job submission failed: {0}")]
    Submission(String),
    /// ジョブ一覧取得時の通信/サービス障害
    #[error("Transcription job listing failed: {0}")]
    List(String),
    /// 成功レスポンスだが形式が想定と異なる
    #[error("Badly formed response: {0}")]
    ResponseFormat(String),
    /// 列挙外のジョブ状態
    #[error("Unknown job status encountered: {0}")]
    UnknownStatus(String),
    /// 入力一覧などストレージ参照の失敗
    #[error("Storage access failed: {0}")]
    Storage(String),
    /// 書き起こし結果 JSON の取得失敗
    #[error("Transcript could not be loaded: {0}")]
    TranscriptLoad(String),
    /// 出力先への書き込み失敗
    #[error("Output failed: {0}")]
    Output(String),
    #[error("Run cancelled")]
    Cancelled,
}

impl TranscribeError {
    /// メトリクス集計用のエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parameter(_) => "E_PARAMETER",
            Self::Submission(_) => "E_SUBMISSION",
            Self::List(_) => "E_LIST",
            Self::ResponseFormat(_) => "E_RESPONSE_FORMAT",
            Self::UnknownStatus(_) => "E_UNKNOWN_STATUS",
            Self::Storage(_) => "E_STORAGE",
            Self::TranscriptLoad(_) => "E_TRANSCRIPT_LOAD",
            Self::Output(_) => "E_OUTPUT",
            Self::Cancelled => "E_CANCELLED",
        }
    }
}
