use chrono::Utc;
use log::{debug, info};

use crate::cli::Prompt;
use crate::config::Settings;
use crate::error::PipelineError;
use crate::model::StructuredContent;
use crate::notion::{markdown_to_blocks, upload_filename, Cover, CreatedPage, NewPage, NotionClient};
use crate::providers::{decode_image, OpenAIProvider};

/// Prompt in, Notion page out
pub struct Pipeline {
    openai: OpenAIProvider,
    notion: NotionClient,
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Result<Self, PipelineError> {
        Ok(Pipeline {
            openai: OpenAIProvider::new(settings)?,
            notion: NotionClient::new(settings)?,
            settings: settings.clone(),
        })
    }

    /// Generate `T` from the prompt and publish it as a page
    ///
    /// Steps run strictly in order and the first failure ends the run. The
    /// target database is checked before any request is made.
    pub async fn run<T: StructuredContent>(&self, prompt: &Prompt) -> Result<CreatedPage, PipelineError> {
        let database_id = self.settings.collection_id(T::COLLECTION)?;

        let content: T = self.openai.generate(prompt).await?;

        let cover = match content.image_prompt() {
            Some(image_prompt) => Some(self.cover_image(&content, &image_prompt).await?),
            None => None,
        };

        let children = markdown_to_blocks(&content.body_markdown());
        debug!("Converted body into {} blocks", children.len());

        let page = NewPage::new(database_id, content.properties(), children, cover);
        let created = self.notion.create_page(&page).await?;
        info!("Published \"{}\" to {}", content.title(), created.url);
        Ok(created)
    }

    async fn cover_image<T: StructuredContent>(
        &self,
        content: &T,
        image_prompt: &str,
    ) -> Result<Cover, PipelineError> {
        let b64 = self.openai.generate_image(image_prompt).await?;
        let bytes = decode_image(&b64)?;

        let filename = upload_filename(
            content.title(),
            T::FILENAME_FALLBACK,
            Utc::now().timestamp_millis(),
        );
        let upload = self.notion.upload_image(&filename, bytes).await?;
        Ok(upload.into_cover())
    }
}

/// Run the whole pipeline once with the given settings
pub async fn publish<T: StructuredContent>(
    settings: &Settings,
    prompt: &Prompt,
) -> Result<CreatedPage, PipelineError> {
    Pipeline::new(settings)?.run::<T>(prompt).await
}
