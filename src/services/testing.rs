//! In-memory stand-ins for the external seams, shared by unit tests.

use crate::models::{AppError, AppResult, Character};
use crate::services::{CharacterSource, DownloadedImage, ImageFetcher};
use crate::storage::{ObjectStore, Partition, StoredObject};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

pub const RICK_IMAGE: &str = "https://rickandmortyapi.com/api/character/avatar/1.jpeg";

pub struct FakeCatalog {
    pub character: Option<Character>,
}

impl FakeCatalog {
    pub fn rick() -> Self {
        Self {
            character: Some(Character {
                id: 1,
                name: "Rick Sanchez".to_string(),
                status: "Alive".to_string(),
                species: "Human".to_string(),
                gender: "Male".to_string(),
                image: RICK_IMAGE.to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn down() -> Self {
        Self { character: None }
    }
}

#[async_trait]
impl CharacterSource for FakeCatalog {
    async fn fetch_random(&self) -> AppResult<Character> {
        self.character
            .clone()
            .ok_or_else(|| AppError::UpstreamUnavailable("catalog down".to_string()))
    }

    async fn fetch_all(&self) -> AppResult<Vec<Character>> {
        match &self.character {
            Some(c) => Ok(vec![c.clone()]),
            None => Err(AppError::UpstreamUnavailable("catalog down".to_string())),
        }
    }
}

pub struct FakeFetcher {
    pub result: Result<DownloadedImage, String>,
}

impl FakeFetcher {
    pub fn serving(content_type: &str) -> Self {
        Self {
            result: Ok(DownloadedImage {
                bytes: vec![0xFF, 0xD8, 0xFF],
                content_type: content_type.to_string(),
            }),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err("connection refused".to_string()),
        }
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn download_image(&self, _url: &str) -> AppResult<DownloadedImage> {
        self.result.clone().map_err(AppError::UpstreamUnavailable)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub fail_uploads: bool,
    pub objects: Mutex<HashMap<(Partition, String), StoredObject>>,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(
        &self,
        partition: Partition,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        if self.fail_uploads {
            return Err(AppError::StorageFailure("bucket unavailable".to_string()));
        }
        self.objects.lock().unwrap().insert(
            (partition, name.to_string()),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("http://store.test/images/{}/{}", partition.as_str(), name))
    }

    async fn download(&self, partition: Partition, name: &str) -> AppResult<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(partition, name.to_string()))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Object {}", name)))
    }

    async fn delete(&self, partition: Partition, name: &str) -> AppResult<()> {
        self.objects.lock().unwrap().remove(&(partition, name.to_string()));
        Ok(())
    }
}
