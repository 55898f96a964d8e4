use crate::models::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// A downloaded image body and its declared content type.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Downloads images from arbitrary URLs.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn download_image(&self, url: &str) -> AppResult<DownloadedImage>;
}

/// Thin wrapper over a shared `reqwest::Client`. Single attempt per call,
/// transport default timeouts.
#[derive(Clone, Default)]
pub struct HttpClientService {
    client: Client,
}

impl HttpClientService {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }
}

#[async_trait]
impl ImageFetcher for HttpClientService {
    async fn download_image(&self, url: &str) -> AppResult<DownloadedImage> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response.bytes().await?.to_vec();

        Ok(DownloadedImage {
            bytes,
            content_type,
        })
    }
}
