use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match cyclecare_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("cyclecare: {e}");
            ExitCode::FAILURE
        }
    }
}
