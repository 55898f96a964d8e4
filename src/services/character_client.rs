use crate::config::CatalogSettings;
use crate::models::{AppResult, Character, CharacterPage};
use crate::services::HttpClientService;
use async_trait::async_trait;
use rand::Rng;

/// Read-only access to the external character catalog.
#[async_trait]
pub trait CharacterSource: Send + Sync {
    /// Fetches one character picked uniformly from the catalog's id range.
    async fn fetch_random(&self) -> AppResult<Character>;

    /// Walks every page of the catalog listing.
    async fn fetch_all(&self) -> AppResult<Vec<Character>>;
}

pub struct RickAndMortyClient {
    http: HttpClientService,
    base_url: String,
    max_character_id: u32,
}

impl RickAndMortyClient {
    pub fn new(http: HttpClientService, settings: &CatalogSettings) -> Self {
        Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_character_id: settings.max_character_id.max(1),
        }
    }

    pub async fn fetch_character(&self, id: u32) -> AppResult<Character> {
        let url = format!("{}/character/{}", self.base_url, id);
        tracing::debug!(%url, "fetching character");

        let character = self.http.get_json::<Character>(&url).await?;
        tracing::debug!(name = %character.name, "fetched character");
        Ok(character)
    }
}

#[async_trait]
impl CharacterSource for RickAndMortyClient {
    async fn fetch_random(&self) -> AppResult<Character> {
        let id = rand::thread_rng().gen_range(1..=self.max_character_id);
        self.fetch_character(id).await
    }

    async fn fetch_all(&self) -> AppResult<Vec<Character>> {
        let mut characters = Vec::new();
        let mut next = Some(format!("{}/character", self.base_url));

        while let Some(url) = next.take() {
            let page = self.http.get_json::<CharacterPage>(&url).await?;
            characters.extend(page.results);
            next = page.info.next.filter(|n| !n.is_empty());
        }

        Ok(characters)
    }
}
