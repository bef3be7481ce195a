pub mod error;
pub mod job;
pub mod language;
pub mod settings;
pub mod types;
