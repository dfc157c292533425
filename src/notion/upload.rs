//! Three-phase file upload: create a slot, send the bytes, complete it.
//!
//! Each phase consumes the previous handle, so an upload cannot be completed
//! before its bytes are sent, and only a completed upload can become a cover.

use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::json;
use std::marker::PhantomData;

use super::page::Cover;
use super::NotionClient;
use crate::error::{PipelineError, ServiceError};
use crate::http::{read_json, required_str};

pub const IMAGE_CONTENT_TYPE: &str = "image/png";

/// Slot reserved, no bytes transferred
#[derive(Debug)]
pub struct Created;

/// Bytes transferred, not yet finalized
#[derive(Debug)]
pub struct Sent;

/// Finalized and usable as a file reference
#[derive(Debug)]
pub struct Completed;

#[derive(Debug)]
pub struct FileUpload<State> {
    id: String,
    filename: String,
    state: PhantomData<State>,
}

impl<State> FileUpload<State> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn advance<Next>(self, id: String) -> FileUpload<Next> {
        FileUpload {
            id,
            filename: self.filename,
            state: PhantomData,
        }
    }
}

impl FileUpload<Created> {
    /// Transmit the image as the upload's single part
    pub async fn send(
        self,
        notion: &NotionClient,
        bytes: Vec<u8>,
    ) -> Result<FileUpload<Sent>, PipelineError> {
        let send_error = |id: &str, source: ServiceError| PipelineError::UploadSend {
            id: id.to_string(),
            source,
        };

        let part = Part::bytes(bytes)
            .file_name(self.filename.clone())
            .mime_str(IMAGE_CONTENT_TYPE)
            .map_err(|e| send_error(&self.id, e.into()))?;
        let form = Form::new().text("part_number", "1").part("file", part);

        let response = notion
            .request(Method::POST, &format!("/v1/file_uploads/{}/send", self.id))
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_error(&self.id, e.into()))?;
        read_json(response)
            .await
            .map_err(|e| send_error(&self.id, e))?;

        debug!("Sent {} for file upload {}", self.filename(), self.id);
        let id = self.id.clone();
        Ok(self.advance(id))
    }
}

impl FileUpload<Sent> {
    /// Finalize the upload
    pub async fn complete(self, notion: &NotionClient) -> Result<FileUpload<Completed>, PipelineError> {
        let complete_error = |source: ServiceError| PipelineError::UploadComplete {
            id: self.id.clone(),
            source,
        };

        let response = notion
            .request(Method::POST, &format!("/v1/file_uploads/{}/complete", self.id))
            .send()
            .await
            .map_err(|e| complete_error(e.into()))?;
        let body = read_json(response).await.map_err(complete_error)?;
        let id = required_str(&body, "id").map_err(complete_error)?.to_string();

        debug!("Completed file upload {} for {}", id, self.filename());
        Ok(self.advance(id))
    }
}

impl FileUpload<Completed> {
    pub fn into_cover(self) -> Cover {
        Cover::FileUpload { id: self.id }
    }
}

impl NotionClient {
    /// Reserve an upload slot for a single PNG image
    pub async fn create_file_upload(
        &self,
        filename: &str,
    ) -> Result<FileUpload<Created>, PipelineError> {
        let response = self
            .request(Method::POST, "/v1/file_uploads")
            .json(&json!({
                "mode": "multi_part",
                "number_of_parts": 1,
                "filename": filename,
                "content_type": IMAGE_CONTENT_TYPE,
            }))
            .send()
            .await
            .map_err(|e| PipelineError::UploadCreate(e.into()))?;
        let body = read_json(response)
            .await
            .map_err(PipelineError::UploadCreate)?;
        let id = required_str(&body, "id").map_err(PipelineError::UploadCreate)?;

        debug!("Created file upload {} for {}", id, filename);
        Ok(FileUpload {
            id: id.to_string(),
            filename: filename.to_string(),
            state: PhantomData,
        })
    }

    /// Run create, send and complete in order
    ///
    /// A failure after the slot is created leaves it behind; the error
    /// carries its id so callers can report it.
    pub async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<FileUpload<Completed>, PipelineError> {
        let created = self.create_file_upload(filename).await?;
        let sent = created.send(self, bytes).await?;
        let completed = sent.complete(self).await?;
        info!("Image {} uploaded to Notion.", completed.filename());
        Ok(completed)
    }
}

/// Lowercase ASCII slug with single hyphens between alphanumeric runs
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// `{timestamp}-{slug}.png`, using `fallback` when the title has no usable characters
pub fn upload_filename(title: &str, fallback: &str, timestamp_millis: i64) -> String {
    let slug = slugify(title);
    let slug = if slug.is_empty() { fallback } else { &slug };
    format!("{}-{}.png", timestamp_millis, slug)
}
