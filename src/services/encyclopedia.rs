use crate::services::{non_empty, strip_markup, Encyclopedia, PageSummary, ProviderError, SearchHit};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Wikipedia client: MediaWiki search API plus the REST page summary endpoint
pub struct WikipediaClient {
    api_url: String,
    rest_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    search: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    title: String,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    extract: Option<String>,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: Option<String>,
}

impl WikipediaClient {
    pub fn new(client: Client, api_url: String, rest_url: String) -> Self {
        Self {
            api_url,
            rest_url,
            client,
        }
    }

    fn page_url(&self, title: &str) -> String {
        let base = self
            .rest_url
            .trim_end_matches('/')
            .trim_end_matches("/api/rest_v1");
        format!("{}/wiki/{}", base, urlencoding::encode(&title.replace(' ', "_")))
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, ProviderError> {
        let url = format!(
            "{}?action=query&list=search&format=json&srprop=snippet&srlimit={}&srsearch={}",
            self.api_url,
            limit,
            urlencoding::encode(query)
        );

        tracing::debug!("Encyclopedia search: {}", query);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Encyclopedia search failed: {}",
                response.status()
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse search: {}", e)))?;

        let hits = parsed
            .query
            .map(|q| q.search)
            .unwrap_or_default()
            .into_iter()
            .take(limit as usize)
            .map(|hit| SearchHit {
                title: hit.title,
                snippet: hit
                    .snippet
                    .map(|s| strip_markup(&s))
                    .filter(|s| !s.is_empty()),
            })
            .collect();

        Ok(hits)
    }

    async fn summary(&self, title: &str) -> Result<PageSummary, ProviderError> {
        let url = format!(
            "{}/page/summary/{}",
            self.rest_url.trim_end_matches('/'),
            urlencoding::encode(&title.replace(' ', "_"))
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!("No summary for {}", title)));
        }
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Encyclopedia summary failed: {}",
                response.status()
            )));
        }

        let parsed: SummaryResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse summary: {}", e)))?;

        let url = parsed
            .content_urls
            .and_then(|c| c.desktop)
            .and_then(|d| d.page)
            .unwrap_or_else(|| self.page_url(title));

        Ok(PageSummary {
            title: non_empty(parsed.title.as_deref()).unwrap_or_else(|| title.to_string()),
            url,
            extract: non_empty(parsed.extract.as_deref()),
            is_disambiguation: parsed.kind.as_deref() == Some("disambiguation"),
        })
    }
}
