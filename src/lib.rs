//! Generate structured content with OpenAI and publish it as a Notion page.
//!
//! Two content types ship with the crate: [`model::Recipe`], published with a
//! generated cover image, and [`model::SpanishTip`], published as text only.
//! Each has its own binary built on [`cli::run`].

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod notion;
pub mod pipeline;
pub mod providers;

mod http;

pub use cli::Prompt;
pub use config::{Collection, Settings};
pub use error::{PipelineError, ServiceError};
pub use model::{Recipe, SpanishTip, StructuredContent};
pub use notion::{CreatedPage, NotionClient};
pub use pipeline::{publish, Pipeline};
pub use providers::OpenAIProvider;
