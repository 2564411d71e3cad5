//! Zotero Web API client using reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{ClientError, LibraryClient, Page, PageRequest};
use crate::models::DeletedKeys;

/// API version sent with every request
const API_VERSION: &str = "3";

/// Request timeout
const TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Zotero Web API v3
pub struct HttpLibraryClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpLibraryClient {
    /// Create a client for `base_url` (e.g. `https://api.zotero.org`)
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("zotroam/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Request {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Zotero-API-Version", API_VERSION);
        match self.api_key {
            Some(ref key) => builder.header("Zotero-API-Key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response, ClientError> {
        builder.send().await.map_err(|e| ClientError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(
        response: Response,
        url: &str,
    ) -> Result<T, ClientError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::InvalidResponse {
                url: url.to_string(),
                details: e.to_string(),
            })
    }
}

#[async_trait]
impl LibraryClient for HttpLibraryClient {
    async fn get(&self, resource_path: &str, request: PageRequest) -> Result<Page, ClientError> {
        let url = self.url(resource_path);
        debug!("GET {} {:?}", url, request);

        let response = self
            .send(
                self.request(Method::GET, &url).query(&page_query(request)),
                &url,
            )
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let last_modified_version = header_u64(response.headers(), "last-modified-version");
        let total_results = header_u64(response.headers(), "total-results");
        let data: Vec<Value> = Self::json(response, &url).await?;

        Ok(Page {
            data,
            last_modified_version,
            total_results,
        })
    }

    async fn get_deleted(
        &self,
        library_path: &str,
        since: u64,
    ) -> Result<DeletedKeys, ClientError> {
        let url = self.url(&format!("{}/deleted", library_path));
        debug!("GET {} since={}", url, since);

        let response = self
            .send(
                self.request(Method::GET, &url)
                    .query(&[("since", since.to_string())]),
                &url,
            )
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        Self::json(response, &url).await
    }

    async fn delete_tags(
        &self,
        library_path: &str,
        tags: &[String],
        version: u64,
    ) -> Result<u64, ClientError> {
        let url = self.url(&format!("{}/tags", library_path));
        debug!("DELETE {} ({} tags) at version {}", url, tags.len(), version);

        let response = self
            .send(
                self.request(Method::DELETE, &url)
                    .header("If-Unmodified-Since-Version", version.to_string())
                    .query(&[("tag", tags.join(" || "))]),
                &url,
            )
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => {
                Ok(header_u64(response.headers(), "last-modified-version").unwrap_or(version))
            }
            StatusCode::PRECONDITION_FAILED => Err(ClientError::PreconditionFailed {
                library_path: library_path.to_string(),
                version,
            }),
            status => Err(ClientError::Status {
                url,
                status: status.as_u16(),
            }),
        }
    }
}

/// Query string of a paginated read; `since` is only sent when non-zero
fn page_query(request: PageRequest) -> Vec<(&'static str, String)> {
    let mut query = Vec::with_capacity(3);
    if let Some(since) = request.since.filter(|&v| v > 0) {
        query.push(("since", since.to_string()));
    }
    if let Some(start) = request.start {
        query.push(("start", start.to_string()));
    }
    query.push(("limit", request.limit.to_string()));
    query
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
