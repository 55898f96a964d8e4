use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_NAME: &str = "Anonymous User";
pub const DEFAULT_GENDER: &str = "Unknown";
pub const DEFAULT_AGE: &str = "Unknown";

/// Cookie carrying the session id between requests.
pub const SESSION_COOKIE: &str = "session_id";

/// An anonymous, time-boxed identity used to author posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub age: String,
    /// Avatar URL. Empty when no avatar could be resolved.
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session carrying sentinel identity fields.
    pub fn new(id: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id,
            name: DEFAULT_NAME.to_string(),
            gender: DEFAULT_GENDER.to_string(),
            age: DEFAULT_AGE.to_string(),
            image: String::new(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Forces any empty identity field back to its sentinel value.
    pub fn normalize_identity(&mut self) {
        if self.name.trim().is_empty() {
            self.name = DEFAULT_NAME.to_string();
        }
        if self.gender.trim().is_empty() {
            self.gender = DEFAULT_GENDER.to_string();
        }
        if self.age.trim().is_empty() {
            self.age = DEFAULT_AGE.to_string();
        }
    }
}

/// Builds a session id from the current nanosecond timestamp and 8 random
/// bytes: `<nanos>-<16 hex chars>`. Collisions are treated as negligible.
pub fn generate_session_id() -> String {
    let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();

    let mut random_bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    format!("{}-{}", timestamp, hex::encode(random_bytes))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateSessionRequest {
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CleanupResponse {
    pub removed: usize,
}
