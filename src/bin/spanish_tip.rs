use prompt_to_notion::{cli, SpanishTip};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    cli::run::<SpanishTip>().await
}
