use log::info;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use super::blocks::{Block, RichText};
use super::NotionClient;
use crate::error::PipelineError;
use crate::http::{read_json, required_str};

/// Page properties keyed by the database's column names
pub type Properties = BTreeMap<String, PropertyValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub name: String,
}

impl SelectOption {
    /// Notion refuses commas in option names, so they are dropped
    pub fn new(name: &str) -> Self {
        SelectOption {
            name: name.replace(',', "").trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateValue {
    pub start: String,
}

/// A typed property value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Number(f64),
    Select(SelectOption),
    MultiSelect(Vec<SelectOption>),
    Date(DateValue),
}

impl PropertyValue {
    pub fn select(name: &str) -> Self {
        PropertyValue::Select(SelectOption::new(name))
    }

    pub fn multi_select<S: AsRef<str>>(names: &[S]) -> Self {
        PropertyValue::MultiSelect(
            names
                .iter()
                .map(|name| SelectOption::new(name.as_ref()))
                .collect(),
        )
    }

    pub fn date(start: impl Into<String>) -> Self {
        PropertyValue::Date(DateValue {
            start: start.into(),
        })
    }
}

/// Page cover: an uploaded file or an external image URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cover {
    FileUpload { id: String },
    External { url: String },
}

impl Serialize for Cover {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            Cover::FileUpload { id } => json!({"type": "file_upload", "file_upload": {"id": id}}),
            Cover::External { url } => json!({"type": "external", "external": {"url": url}}),
        };
        value.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parent {
    pub database_id: String,
}

/// Body of one page creation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPage {
    pub parent: Parent,
    pub properties: Properties,
    pub children: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Cover>,
}

impl NewPage {
    pub fn new(
        database_id: impl Into<String>,
        properties: Properties,
        children: Vec<Block>,
        cover: Option<Cover>,
    ) -> Self {
        NewPage {
            parent: Parent {
                database_id: database_id.into(),
            },
            properties,
            children,
            cover,
        }
    }
}

/// The page Notion created
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPage {
    pub id: String,
    pub url: String,
}

impl NotionClient {
    /// Create a page in a database with its content and optional cover
    pub async fn create_page(&self, page: &NewPage) -> Result<CreatedPage, PipelineError> {
        let response = self
            .request(Method::POST, "/v1/pages")
            .json(page)
            .send()
            .await
            .map_err(|e| PipelineError::Publish(e.into()))?;
        let body = read_json(response).await.map_err(PipelineError::Publish)?;

        let created = CreatedPage {
            id: required_str(&body, "id")
                .map_err(PipelineError::Publish)?
                .to_string(),
            url: required_str(&body, "url")
                .map_err(PipelineError::Publish)?
                .to_string(),
        };
        info!("Notion page created.");
        Ok(created)
    }
}
