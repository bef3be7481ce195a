//! 言語・音声フォーマット・PII 種別の静的レジストリ。

use crate::domain::job::AUTO_LANGUAGE;

/// 対応言語コードと表示名
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    (AUTO_LANGUAGE, "auto"),
    ("ar-AE", "Gulf Arabic"),
    ("ar-SA", "Modern Standard Arabic"),
    ("zh-CN", "Mandarin Chinese – Mainland"),
    ("nl-NL", "Dutch"),
    ("en-AU", "Australian English"),
    ("en-GB", "British English"),
    ("en-IN", "Indian English"),
    ("en-IE", "Irish English"),
    ("en-AB", "Scottish English"),
    ("en-US", "US English"),
    ("en-WL", "Welsh English"),
    ("es-ES", "Spanish"),
    ("es-US", "US Spanish"),
    ("fr-FR", "French"),
    ("fr-CA", "Canadian French"),
    ("fa-IR", "Farsi Persian"),
    ("de-DE", "German"),
    ("de-CH", "Swiss German"),
    ("he-IL", "Hebrew"),
    ("hi-IN", "Indian Hindi"),
    ("id-ID", "Indonesian"),
    ("it-IT", "Italian"),
    ("ja-JP", "Japanese"),
    ("ko-KR", "Korean"),
    ("ms-MY", "Malay"),
    ("pt-PT", "Portuguese"),
    ("pt-BR", "Brazilian Portuguese"),
    ("ru-RU", "Russian"),
    ("ta-IN", "Tamil"),
    ("te-IN", "Telugu"),
    ("tr-TR", "Turkish"),
];

/// 対応音声コンテナ（拡張子）
pub const SUPPORTED_AUDIO_FORMATS: &[&str] = &["flac", "mp3", "mp4", "ogg", "webm", "amr", "wav"];

/// PII 秘匿化で指定可能なエンティティ種別
pub const SUPPORTED_PII_TYPES: &[&str] = &[
    "BANK_ACCOUNT_NUMBER",
    "BANK_ROUTING",
    "CREDIT_DEBIT_NUMBER",
    "CREDIT_DEBIT_CVV",
    "CREDIT_DEBIT_EXPIRY",
    "PIN",
    "EMAIL",
    "ADDRESS",
    "NAME",
    "PHONE",
    "SSN",
    "ALL",
];

pub fn display_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// "auto" も対応言語として扱う
pub fn is_supported_language(code: &str) -> bool {
    display_name(code).is_some()
}

/// 拡張子で対応フォーマットか判定する（大文字小文字は区別しない）
pub fn is_supported_audio(path: &str) -> bool {
    has_extension(path, SUPPORTED_AUDIO_FORMATS)
}

/// ファイル名の拡張子が `extensions` のいずれかに一致するか
pub fn has_extension(path: &str, extensions: &[&str]) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            extensions.iter().any(|f| f.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}

pub fn is_supported_pii_type(pii_type: &str) -> bool {
    SUPPORTED_PII_TYPES.contains(&pii_type)
}
