mod json_lines;

pub use json_lines::JsonLinesSink;

use crate::domain::error::TranscribeError;
use crate::domain::types::{ResultRow, COLUMN_DESCRIPTIONS};

/// 結果行の出力先 trait
pub trait RowSink: Send {
    fn write_rows(&mut self, rows: &[ResultRow]) -> Result<(), TranscribeError>;
    fn name(&self) -> &str;
}

/// 出力列のスキーマ（列名と説明）。`json` 列は display_json 有効時のみ。
pub fn column_schema(display_json: bool) -> serde_json::Value {
    let columns: Vec<serde_json::Value> = COLUMN_DESCRIPTIONS
        .iter()
        .filter(|(name, _)| display_json || *name != "json")
        .map(|(name, description)| serde_json::json!({ "name": name, "description": description }))
        .collect();
    serde_json::Value::Array(columns)
}
