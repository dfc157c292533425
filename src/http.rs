use log::debug;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use crate::error::ServiceError;

/// Build a client, applying a timeout only when one is configured
pub(crate) fn build_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Read a JSON body, turning non-success statuses into `ServiceError::Status`
pub(crate) async fn read_json(response: Response) -> Result<Value, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        return Err(ServiceError::Status { status, body });
    }

    let text = response.text().await?;
    let body: Value = serde_json::from_str(&text)?;
    debug!("{:?}", body);
    Ok(body)
}

/// Pull a required string field out of a JSON object
pub(crate) fn required_str<'a>(
    body: &'a Value,
    field: &'static str,
) -> Result<&'a str, ServiceError> {
    body[field]
        .as_str()
        .filter(|value| !value.is_empty())
        .ok_or(ServiceError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_json_rejects_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let response = reqwest::get(format!("{}/broken", server.url())).await.unwrap();
        let result = read_json(response).await;

        assert!(matches!(result, Err(ServiceError::Json(_))));
    }

    #[tokio::test]
    async fn test_read_json_keeps_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/limited")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let response = reqwest::get(format!("{}/limited", server.url())).await.unwrap();
        match read_json(response).await {
            Err(ServiceError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_required_str() {
        let body = json!({"id": "abc", "empty": ""});
        assert_eq!(required_str(&body, "id").unwrap(), "abc");
        assert!(matches!(
            required_str(&body, "empty"),
            Err(ServiceError::MissingField("empty"))
        ));
        assert!(required_str(&body, "url").is_err());
    }
}
