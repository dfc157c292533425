use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to a remote service (OpenAI or Notion)
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Transport-level failure (connection, TLS, body read)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("service responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body was not the JSON shape we expected
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// A field we rely on was missing from an otherwise valid response
    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    /// The model declined to answer
    #[error("model refused: {0}")]
    Refused(String),

    /// The model stopped before producing a complete answer
    #[error("response incomplete: {0}")]
    Incomplete(String),

    /// Image bytes could not be decoded
    #[error("invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Errors that can occur while turning a prompt into a Notion page
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No prompt was supplied on the command line
    #[error("Please provide a prompt as an argument. Use --prompt \"...\"")]
    MissingInput,

    /// Settings could not be loaded or are incomplete
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The target collection id for this content type is not configured
    #[error("Configuration error: {0} is not set")]
    MissingCollection(&'static str),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Structured text generation failed or returned nothing usable
    #[error("Failed to generate content: {0}")]
    Generation(#[source] ServiceError),

    /// Image generation failed or returned no image bytes
    #[error("Failed to generate image: {0}")]
    ImageGeneration(#[source] ServiceError),

    /// No upload slot could be reserved
    #[error("Failed to create file upload: {0}")]
    UploadCreate(#[source] ServiceError),

    /// The image bytes were not accepted for an existing upload slot
    #[error("Failed to send file upload {id}: {source}")]
    UploadSend {
        id: String,
        #[source]
        source: ServiceError,
    },

    /// The upload could not be finalized
    #[error("Failed to complete file upload {id}: {source}")]
    UploadComplete {
        id: String,
        #[source]
        source: ServiceError,
    },

    /// Notion rejected the page creation request
    #[error("Failed to create Notion page: {0}")]
    Publish(#[source] ServiceError),
}

impl PipelineError {
    /// The id of an upload slot left behind by this failure, if any
    pub fn orphaned_upload(&self) -> Option<&str> {
        match self {
            PipelineError::UploadSend { id, .. } | PipelineError::UploadComplete { id, .. } => {
                Some(id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_include_cause() {
        let err = PipelineError::UploadSend {
            id: "fu_1".to_string(),
            source: ServiceError::Status {
                status: StatusCode::BAD_REQUEST,
                body: "bad part".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("fu_1"));
        assert!(message.contains("400"));
        assert!(message.contains("bad part"));
    }

    #[test]
    fn test_orphaned_upload() {
        let err = PipelineError::UploadComplete {
            id: "fu_2".to_string(),
            source: ServiceError::MissingField("id"),
        };
        assert_eq!(err.orphaned_upload(), Some("fu_2"));
        assert_eq!(PipelineError::MissingInput.orphaned_upload(), None);
    }
}
