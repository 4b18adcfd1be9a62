use splitdl_core::logging;

mod cli;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; a missing state dir must not stop a download.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }

    match cli::run_from_args().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("splitdl error: {:#}", err);
            std::process::exit(1);
        }
    }
}
