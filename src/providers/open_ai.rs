use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info};
use reqwest::Client;
use serde_json::{json, Value};

use crate::cli::Prompt;
use crate::config::Settings;
use crate::error::{PipelineError, ServiceError};
use crate::http::{build_client, read_json};
use crate::model::StructuredContent;

/// Resolution requested for cover images
pub const IMAGE_SIZE: &str = "1024x1024";

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from settings
    pub fn new(settings: &Settings) -> Result<Self, PipelineError> {
        let client = build_client(settings.http_timeout()).map_err(PipelineError::Client)?;

        Ok(OpenAIProvider {
            client,
            api_key: settings.openai_api_key.clone(),
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            model: settings.openai_model.clone(),
            image_model: settings.openai_image_model.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            image_model: "gpt-image-1".to_string(),
        }
    }

    #[doc(hidden)]
    pub fn with_image_model(mut self, image_model: impl Into<String>) -> Self {
        self.image_model = image_model.into();
        self
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ServiceError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Ask the model for content matching `T`'s schema
    ///
    /// One attempt only. A response without parseable output is an error.
    pub async fn generate<T: StructuredContent>(&self, prompt: &Prompt) -> Result<T, PipelineError> {
        let request = json!({
            "model": self.model,
            "input": prompt.as_str(),
            "instructions": T::INSTRUCTIONS,
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": T::SCHEMA_NAME,
                    "schema": T::schema(),
                    "strict": true
                }
            }
        });

        let body = self
            .post("/v1/responses", &request)
            .await
            .map_err(PipelineError::Generation)?;
        let text = output_text(&body).map_err(PipelineError::Generation)?;
        let content: T = serde_json::from_str(text)
            .map_err(|e| PipelineError::Generation(ServiceError::Json(e)))?;

        info!("Generated {} \"{}\"", T::SCHEMA_NAME, content.title());
        Ok(content)
    }

    /// Generate a square image and return it base64-encoded
    pub async fn generate_image(&self, prompt: &str) -> Result<String, PipelineError> {
        let mut request = json!({
            "model": self.image_model,
            "prompt": prompt,
            "size": IMAGE_SIZE,
            "n": 1
        });
        // gpt-image models always answer in base64 and reject the parameter
        if self.image_model.starts_with("dall-e") {
            request["response_format"] = json!("b64_json");
        }

        let body = self
            .post("/v1/images/generations", &request)
            .await
            .map_err(PipelineError::ImageGeneration)?;
        let b64 = body["data"][0]["b64_json"]
            .as_str()
            .filter(|data| !data.is_empty())
            .ok_or(PipelineError::ImageGeneration(ServiceError::MissingField(
                "b64_json",
            )))?;

        info!("Image generated.");
        Ok(b64.to_string())
    }
}

/// Decode a base64 image payload into raw bytes
pub fn decode_image(b64: &str) -> Result<Vec<u8>, PipelineError> {
    STANDARD
        .decode(b64.trim())
        .map_err(|e| PipelineError::ImageGeneration(e.into()))
}

/// The text of the first message output, or why there is none
fn output_text(body: &Value) -> Result<&str, ServiceError> {
    if body["status"] == "incomplete" {
        let reason = body["incomplete_details"]["reason"]
            .as_str()
            .unwrap_or("unknown reason");
        return Err(ServiceError::Incomplete(reason.to_string()));
    }

    let contents = body["output"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|item| item["type"] == "message")
        .flat_map(|item| item["content"].as_array().into_iter().flatten());

    for content in contents {
        match content["type"].as_str() {
            Some("output_text") => {
                if let Some(text) = content["text"].as_str() {
                    return Ok(text);
                }
            }
            Some("refusal") => {
                let refusal = content["refusal"].as_str().unwrap_or_default();
                return Err(ServiceError::Refused(refusal.to_string()));
            }
            other => debug!("Skipping output content of type {:?}", other),
        }
    }

    Err(ServiceError::MissingField("output_text"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Level, SpanishTip};
    use mockito::{Matcher, Server};

    const TIP: &str = r#"{\"title\":\"Ser vs. Estar\",\"category\":\"🔷 Core Grammar & Verb Use\",\"subcategory\":\"Verb Usage / Meaning Differences\",\"level\":\"🟢 A1: Beginner\",\"explanation\":\"Identity vs state.\",\"examples\":\"Soy alto.\",\"practicePrompt\":\"Describe yourself.\"}"#;

    fn responses_body(text: &str) -> String {
        format!(
            r#"{{
                "id": "resp_1",
                "status": "completed",
                "output": [
                    {{"type": "reasoning", "summary": []}},
                    {{"type": "message", "role": "assistant", "content": [
                        {{"type": "output_text", "text": "{}"}}
                    ]}}
                ]
            }}"#,
            text
        )
    }

    fn provider(server: &Server) -> OpenAIProvider {
        OpenAIProvider::with_base_url("fake_api_key".to_string(), server.url(), "gpt-5".to_string())
    }

    fn prompt() -> Prompt {
        Prompt::new("ser vs estar").unwrap()
    }

    #[tokio::test]
    async fn test_generate() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/responses")
            .match_header("authorization", "Bearer fake_api_key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-5",
                "input": "ser vs estar",
                "text": {"format": {"type": "json_schema", "name": "tip", "strict": true}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(responses_body(TIP))
            .create_async()
            .await;

        let tip: SpanishTip = provider(&server).generate(&prompt()).await.unwrap();

        assert_eq!(tip.title, "Ser vs. Estar");
        assert_eq!(tip.level, Level::A1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_without_output() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/responses")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "resp_1", "status": "completed", "output": []}"#)
            .create_async()
            .await;

        let result = provider(&server).generate::<SpanishTip>(&prompt()).await;
        assert!(matches!(
            result,
            Err(PipelineError::Generation(ServiceError::MissingField("output_text")))
        ));
    }

    #[tokio::test]
    async fn test_generate_refusal() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/responses")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status": "completed", "output": [{"type": "message", "content": [
                    {"type": "refusal", "refusal": "I can't help with that."}
                ]}]}"#,
            )
            .create_async()
            .await;

        let err = provider(&server)
            .generate::<SpanishTip>(&prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(ServiceError::Refused(_))));
        assert!(err.to_string().contains("I can't help with that."));
    }

    #[tokio::test]
    async fn test_generate_incomplete() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/responses")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status": "incomplete", "incomplete_details": {"reason": "max_output_tokens"}, "output": []}"#,
            )
            .create_async()
            .await;

        let err = provider(&server)
            .generate::<SpanishTip>(&prompt())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("max_output_tokens"));
    }

    #[tokio::test]
    async fn test_generate_nonconforming_output() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/responses")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(responses_body(r#"{\"title\":\"Only a title\"}"#))
            .create_async()
            .await;

        let result = provider(&server).generate::<SpanishTip>(&prompt()).await;
        assert!(matches!(
            result,
            Err(PipelineError::Generation(ServiceError::Json(_)))
        ));
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/responses")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let err = provider(&server)
            .generate::<SpanishTip>(&prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(ServiceError::Status { .. })));
        assert!(err.to_string().contains("Incorrect API key"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_image() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/images/generations")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-image-1",
                "size": "1024x1024",
                "prompt": "A bowl of soup"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"created": 1, "data": [{"b64_json": "aGVsbG8="}]}"#)
            .create_async()
            .await;

        let b64 = provider(&server).generate_image("A bowl of soup").await.unwrap();

        assert_eq!(b64, "aGVsbG8=");
        assert_eq!(decode_image(&b64).unwrap(), b"hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_image_dall_e_requests_base64() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/images/generations")
            .match_body(Matcher::PartialJson(json!({"response_format": "b64_json"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"b64_json": "aGVsbG8="}]}"#)
            .create_async()
            .await;

        provider(&server)
            .with_image_model("dall-e-3")
            .generate_image("A bowl of soup")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_image_without_bytes() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/images/generations")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"url": "https://images.example.com/soup.png"}]}"#)
            .create_async()
            .await;

        let result = provider(&server).generate_image("A bowl of soup").await;
        assert!(matches!(
            result,
            Err(PipelineError::ImageGeneration(ServiceError::MissingField("b64_json")))
        ));
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(matches!(
            decode_image("not base64!!"),
            Err(PipelineError::ImageGeneration(ServiceError::Decode(_)))
        ));
    }
}
