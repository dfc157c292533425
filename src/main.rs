use prompt_to_notion::{cli, Recipe};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    cli::run::<Recipe>().await
}
