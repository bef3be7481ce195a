pub mod assembler;
pub mod client;
pub mod run;
pub mod submitter;
pub mod tracker;
