use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::TranscribeError;
use crate::domain::job::AUTO_LANGUAGE;
use crate::domain::language;

/// 並列ワーカー数の上限
pub const MAX_PARALLEL_WORKERS: usize = 100;

/// 実行設定。起動時に1度だけ組み立て、各コンポーネントへ参照で渡す。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// 言語コード、または "auto"
    pub language: String,
    /// 生の結果 JSON を出力列に含めるか
    pub display_json: bool,
    /// ローカルタイムアウト有効/無効
    pub use_timeout: bool,
    /// タイムアウト（分）。ジョブ作成時刻から計測する。
    pub timeout_minutes: u32,
    /// 投入時の同時実行数 (1–100)
    pub parallel_workers: usize,
    /// SDK のリトライ回数
    pub max_attempts: u32,
    /// ポーリング間隔（秒）
    pub poll_interval_secs: u64,
    /// 一覧取得の方式
    pub list_mode: ListMode,
    /// 投入失敗時の扱い
    pub error_handling: ErrorHandling,
    /// 話者ラベル数（None = 話者分離なし）
    pub max_speaker_labels: Option<u32>,
    /// PII 秘匿化
    pub redact_pii: bool,
    /// 秘匿化対象の PII 種別（空 = ALL）
    pub pii_types: Vec<String>,
    /// 入出力の S3 配置
    pub storage: StorageConfig,
}

/// 一覧取得の方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// ステータス指定なしで1回
    Single,
    /// ステータスごとに並列で問い合わせて結合
    PerStatus,
}

/// 投入失敗時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// 最初の失敗で実行全体を中断
    Fail,
    /// 失敗を行に記録して継続
    Log,
}

/// 入力音声と出力結果の S3 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub input_bucket: String,
    /// バケット内のルート（先頭スラッシュなし）
    pub input_root: String,
    /// 省略時は入力と同じ
    pub output_bucket: Option<String>,
    pub output_root: Option<String>,
}

impl StorageConfig {
    pub fn output_bucket(&self) -> &str {
        self.output_bucket.as_deref().unwrap_or(&self.input_bucket)
    }

    pub fn output_root(&self) -> &str {
        self.output_root.as_deref().unwrap_or(&self.input_root)
    }

    /// 音声ファイルの S3 URI。`source_path` はルートからの相対（先頭 "/"）。
    pub fn media_uri(&self, source_path: &str) -> String {
        format!(
            "s3://{}/{}",
            self.input_bucket,
            join_key(&self.input_root, source_path)
        )
    }

    /// 結果 JSON の出力先プレフィックス（末尾 "/"）
    pub fn response_prefix(&self) -> String {
        format!("{}/", join_key(self.output_root(), "response"))
    }
}

/// S3 キーの結合。余分なスラッシュを作らない。
pub fn join_key(root: &str, path: &str) -> String {
    let root = root.trim_matches('/');
    let path = path.trim_start_matches('/');
    if root.is_empty() {
        path.to_string()
    } else {
        format!("{root}/{path}")
    }
}

/// AWS 認証情報。未指定の項目は SDK のデフォルトチェーンに任せる。
#[derive(Clone, Default)]
pub struct AwsCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub region: Option<String>,
}

impl AwsCredentials {
    /// アクセスキーが明示されているか
    pub fn is_explicit(&self) -> bool {
        self.access_key_id.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .field("region", &self.region)
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            language: AUTO_LANGUAGE.to_string(),
            display_json: false,
            use_timeout: false,
            timeout_minutes: 120,
            parallel_workers: 4,
            max_attempts: 20,
            poll_interval_secs: 5,
            list_mode: ListMode::Single,
            error_handling: ErrorHandling::Fail,
            max_speaker_labels: None,
            redact_pii: false,
            pii_types: vec![],
            storage: StorageConfig::default(),
        }
    }
}

impl RunConfig {
    /// 設定値を検証する。リモート呼び出し前に失敗させる。
    pub fn validate(&self) -> Result<(), TranscribeError> {
        if !language::is_supported_language(&self.language) {
            return Err(TranscribeError::Parameter(format!(
                "Invalid language code: {}",
                self.language
            )));
        }
        if !(1..=MAX_PARALLEL_WORKERS).contains(&self.parallel_workers) {
            return Err(TranscribeError::Parameter(format!(
                "Concurrency must be between 1 and {MAX_PARALLEL_WORKERS}"
            )));
        }
        if self.use_timeout && self.timeout_minutes == 0 {
            return Err(TranscribeError::Parameter(
                "Timeout has to be larger than zero".to_string(),
            ));
        }
        if self.max_speaker_labels == Some(0) {
            return Err(TranscribeError::Parameter(
                "Number of speakers has to be more than zero".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(TranscribeError::Parameter(
                "Polling interval has to be larger than zero".to_string(),
            ));
        }
        if self.storage.input_bucket.is_empty() {
            return Err(TranscribeError::Parameter(
                "Input bucket has to be set".to_string(),
            ));
        }
        if self.redact_pii {
            self.normalized_pii_types()?;
        }
        Ok(())
    }

    /// PII 種別を正規化する。空なら ALL、未対応の種別が1つでもあればエラー。
    pub fn normalized_pii_types(&self) -> Result<Vec<String>, TranscribeError> {
        if self.pii_types.is_empty() {
            return Ok(vec!["ALL".to_string()]);
        }
        let mut types: Vec<String> = Vec::with_capacity(self.pii_types.len());
        for t in &self.pii_types {
            let t = t.trim();
            if !language::is_supported_pii_type(t) {
                return Err(TranscribeError::Parameter(format!("Invalid PII type: {t}")));
            }
            if !types.iter().any(|x| x == t) {
                types.push(t.to_string());
            }
        }
        Ok(types)
    }

    /// タイムアウト無効なら None
    pub fn job_timeout(&self) -> Option<chrono::Duration> {
        self.use_timeout
            .then(|| chrono::Duration::minutes(i64::from(self.timeout_minutes)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
