// src/main.rs

use benchrunner::progress::Progress;
use benchrunner::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    let progress = Progress::new();

    if let Err(err) = logging::init_logging(args.requested_log_level(), &progress) {
        eprintln!("benchrunner error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args, progress).await {
        eprintln!("benchrunner error: {err}");
        if let Some(recovery) = err.recovery() {
            eprintln!("to clean up manually, run: {recovery}");
        }
        std::process::exit(1);
    }
}
