// src/main.rs

use std::process::ExitCode;

use shellstate::{cli, logging, run};

// Returning `ExitCode` lets the runtime shut down, so `kill_on_drop` children
// of cancelled tasks are still killed.
#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("shellstate error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
