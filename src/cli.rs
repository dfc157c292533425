use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::fmt;
use std::process::ExitCode;

use crate::config::Settings;
use crate::error::PipelineError;
use crate::model::StructuredContent;
use crate::notion::CreatedPage;
use crate::pipeline::Pipeline;

/// Generate content from a prompt and publish it to a Notion database
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Free-text description of what to generate
    #[arg(long)]
    pub prompt: Option<String>,
}

impl Args {
    pub fn into_prompt(self) -> Result<Prompt, PipelineError> {
        Prompt::new(self.prompt.unwrap_or_default())
    }
}

/// A non-empty user prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Result<Self, PipelineError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::MissingInput);
        }
        Ok(Prompt(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared entry point for the publishing binaries
///
/// Prints `NOTION_PAGE_URL=<url>` on success so automation can capture it.
/// Every failure is reported on stderr with exit status 1.
pub async fn run<T: StructuredContent>() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {e}");
        }
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        // --help and --version
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    match execute::<T>(args).await {
        Ok(page) => {
            println!("NOTION_PAGE_URL={}", page.url);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(id) = e.orphaned_upload() {
                warn!("Abandoning file upload {id}; Notion expires unattached uploads");
            }
            error!("{} publishing failed", T::SCHEMA_NAME);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute<T: StructuredContent>(args: Args) -> Result<CreatedPage, PipelineError> {
    let prompt = args.into_prompt()?;
    info!("Prompt received: {prompt}");

    let settings = Settings::load()?;
    Pipeline::new(&settings)?.run::<T>(&prompt).await
}
