use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use transcribe_batch::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Ctrl-C で待機中のポーリングを打ち切る
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping the run");
            on_signal.cancel();
        }
    });

    match transcribe_batch::run(cli, cancel).await {
        Ok(summary) => {
            log::info!(
                "Metrics: {}",
                serde_json::to_string(&summary).unwrap_or_default()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
