//! Supabase storage REST API.
//!
//! Objects are fetched with `GET {url}/storage/v1/object/{bucket}/{path}`,
//! authenticated by the project key in both `apikey` and `Authorization`.

use crate::domain::ports::ObjectStorage;
use crate::infrastructure::core::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use tracing::info;
use url::Url;

/// Shared connection details for a Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    client: ClientWithMiddleware,
    url: String,
    key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl SupabaseClient {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            url: url.into().trim_end_matches('/').to_string(),
            key: key.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.authorized(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.authorized(self.client.post(url))
    }
}

pub struct SupabaseObjectStorage {
    client: SupabaseClient,
}

impl SupabaseObjectStorage {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Object URL with each bucket and path segment percent-encoded.
    fn object_url(&self, bucket: &str, path: &str) -> Result<Url> {
        let mut url = Url::parse(self.client.url())
            .with_context(|| format!("Invalid Supabase URL {}", self.client.url()))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Supabase URL {} cannot take a path", self.client.url()))?
            .pop_if_empty()
            .extend(["storage", "v1", "object", bucket])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseObjectStorage {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        let url = self.object_url(bucket, path)?;
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to download {}/{} from Supabase", bucket, path))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Supabase download of {}/{} failed ({}): {}",
                bucket,
                path,
                status,
                error_text
            );
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read Supabase object body")?;
        info!(
            "SupabaseObjectStorage: downloaded {}/{} ({} bytes)",
            bucket,
            path,
            bytes.len()
        );
        Ok(bytes.to_vec())
    }
}
