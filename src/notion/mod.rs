mod blocks;
mod page;
mod upload;

pub use blocks::{
    markdown_to_blocks, markdown_to_rich_text, plain_text, Annotations, Block, RichText,
    MAX_ARRAY_LENGTH, MAX_NESTING_DEPTH, MAX_TEXT_LENGTH,
};
pub use page::{Cover, CreatedPage, NewPage, Properties, PropertyValue, SelectOption};
pub use upload::{slugify, upload_filename, Completed, Created, FileUpload, Sent, IMAGE_CONTENT_TYPE};

use reqwest::{Client, Method, RequestBuilder};

use crate::config::Settings;
use crate::error::PipelineError;
use crate::http::build_client;

/// Thin client for the parts of the Notion API this crate uses
pub struct NotionClient {
    client: Client,
    api_key: String,
    base_url: String,
    version: String,
}

impl NotionClient {
    /// Create a Notion client from settings
    pub fn new(settings: &Settings) -> Result<Self, PipelineError> {
        let client = build_client(settings.http_timeout()).map_err(PipelineError::Client)?;

        Ok(NotionClient {
            client,
            api_key: settings.notion_key.clone(),
            base_url: settings.notion_base_url.trim_end_matches('/').to_string(),
            version: settings.notion_version.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        NotionClient {
            client: Client::new(),
            api_key,
            base_url,
            version: "2022-06-28".to_string(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Notion-Version", &self.version)
    }
}
