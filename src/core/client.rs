use crate::core::{PageCursor, PageResponse, PageSource, Query};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// HTTP Basic credentials for the PassiveTotal API.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

pub struct PassiveTotalClient {
    client: Client,
    credentials: Credentials,
}

impl PassiveTotalClient {
    /// `timeout` of `None` keeps reqwest's default of waiting indefinitely.
    pub fn new(credentials: Credentials, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            credentials,
        })
    }
}

#[async_trait]
impl PageSource for PassiveTotalClient {
    async fn fetch_page(
        &self,
        endpoint: &str,
        query: &Query,
        cursor: Option<&PageCursor>,
    ) -> Result<PageResponse> {
        let mut params = vec![("query", query.as_str())];
        if let Some(cursor) = cursor {
            params.push(("page", cursor.as_str()));
        }

        tracing::debug!("GET {} query={} page={:?}", endpoint, query, cursor.map(PageCursor::as_str));
        let response = self
            .client
            .get(endpoint)
            .basic_auth(&self.credentials.username, Some(&self.credentials.api_key))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status != StatusCode::OK {
            return Ok(PageResponse::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(PageResponse::Ok(serde_json::from_slice(&body)?))
    }
}
