pub mod clock;
pub mod metrics;
pub mod output;
pub mod sdk_config;
pub mod storage;
pub mod transcribe;
