//! Elasticsearch-compatible index for the template catalog.
//!
//! This is an auxiliary copy of the catalog for full-text tooling; ranking never reads it.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api_connection::ApiConnectionError;
use crate::catalog::Template;

pub struct SearchIndexClient {
    client: Client,
    base_url: String,
    index_name: String,
}

impl SearchIndexClient {
    pub fn new(base_url: &str, index_name: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            index_name: index_name.to_string(),
        }
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index_name)
    }

    fn document_url(&self, id: u64) -> String {
        format!("{}/_doc/{}", self.index_url(), id)
    }

    pub async fn index_exists(&self) -> Result<bool, ApiConnectionError> {
        let response = self.client.head(self.index_url()).send().await?;
        exists_from_status(response.status())
    }

    /// Creates the index with the template mapping unless it already exists.
    /// Returns whether it was created.
    pub async fn ensure_index(&self) -> Result<bool, ApiConnectionError> {
        if self.index_exists().await? {
            debug!(index = %self.index_name, "Index already exists");
            return Ok(false);
        }

        let response = self
            .client
            .put(self.index_url())
            .json(&index_mapping())
            .send()
            .await?;
        check_success(response).await?;
        info!(index = %self.index_name, "Created search index");
        Ok(true)
    }

    /// Upserts every template, using its id as the document id.
    pub async fn index_templates(&self, templates: &[Template]) -> Result<usize, ApiConnectionError> {
        for template in templates {
            let response = self
                .client
                .put(self.document_url(template.id))
                .json(template)
                .send()
                .await?;
            check_success(response).await?;
        }
        info!(index = %self.index_name, count = templates.len(), "Indexed templates");
        Ok(templates.len())
    }

    pub async fn document_exists(&self, id: u64) -> Result<bool, ApiConnectionError> {
        let response = self.client.head(self.document_url(id)).send().await?;
        exists_from_status(response.status())
    }
}

/// Mapping for template documents: exact-match ids, categories and tags; full-text descriptions.
pub fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "template_id": { "type": "keyword" },
                "description": { "type": "text" },
                "category": { "type": "keyword" },
                "tags": { "type": "keyword" }
            }
        }
    })
}

fn exists_from_status(status: StatusCode) -> Result<bool, ApiConnectionError> {
    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        Err(ApiConnectionError::ApiError {
            status,
            error_body: String::new(),
        })
    }
}

async fn check_success(response: reqwest::Response) -> Result<(), ApiConnectionError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    Err(ApiConnectionError::ApiError { status, error_body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_marks_tags_as_keywords() {
        let mapping = index_mapping();
        let props = &mapping["mappings"]["properties"];
        assert_eq!(props["template_id"]["type"], "keyword");
        assert_eq!(props["description"]["type"], "text");
        assert_eq!(props["tags"]["type"], "keyword");
    }

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let client = SearchIndexClient::new("http://localhost:9200/", "ad_templates");
        assert_eq!(client.index_url(), "http://localhost:9200/ad_templates");
        assert_eq!(client.document_url(3), "http://localhost:9200/ad_templates/_doc/3");
    }

    #[test]
    fn status_mapping() {
        assert!(exists_from_status(StatusCode::OK).unwrap());
        assert!(!exists_from_status(StatusCode::NOT_FOUND).unwrap());
        assert!(matches!(
            exists_from_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(ApiConnectionError::ApiError { .. })
        ));
    }
}
