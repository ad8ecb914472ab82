use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use axum::body::Bytes;
use mime::Mime;
use uuid::Uuid;

use crate::identity::domain::UserId;

/// File storage seam. `put` returns the public URL of the stored object.
pub trait MediaStore: Send + Sync {
    fn put(
        &self,
        owner: &UserId,
        content_type: &Mime,
        bytes: Bytes,
    ) -> Result<String, MediaError>;
    fn remove(&self, url: &str) -> Result<(), MediaError>;
    fn get(&self, key: &str) -> Result<Option<StoredMedia>, MediaError>;

    /// Uploader of the object behind `url`, or `None` for URLs this store does not hold.
    fn owner_of(&self, url: &str) -> Result<Option<UserId>, MediaError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media object not found")]
    NotFound,
    #[error("media store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    pub owner: UserId,
    pub content_type: Mime,
    pub bytes: Bytes,
}

/// Keeps uploads in process memory and serves them under `public_base_url`.
#[derive(Debug)]
pub struct InMemoryMediaStore {
    public_base_url: String,
    objects: Mutex<HashMap<String, StoredMedia>>,
}

impl InMemoryMediaStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    fn key_for(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    fn objects(&self) -> Result<MutexGuard<'_, HashMap<String, StoredMedia>>, MediaError> {
        self.objects
            .lock()
            .map_err(|_| MediaError::Unavailable("media lock poisoned".to_string()))
    }
}

impl MediaStore for InMemoryMediaStore {
    fn put(
        &self,
        owner: &UserId,
        content_type: &Mime,
        bytes: Bytes,
    ) -> Result<String, MediaError> {
        let key = format!("{}.{}", Uuid::new_v4().simple(), extension_for(content_type));
        self.objects()?.insert(
            key.clone(),
            StoredMedia {
                owner: owner.clone(),
                content_type: content_type.clone(),
                bytes,
            },
        );
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    fn remove(&self, url: &str) -> Result<(), MediaError> {
        let key = self.key_for(url).ok_or(MediaError::NotFound)?;
        self.objects()?
            .remove(&key)
            .map(|_| ())
            .ok_or(MediaError::NotFound)
    }

    fn get(&self, key: &str) -> Result<Option<StoredMedia>, MediaError> {
        Ok(self.objects()?.get(key).cloned())
    }

    fn owner_of(&self, url: &str) -> Result<Option<UserId>, MediaError> {
        let Some(key) = self.key_for(url) else {
            return Ok(None);
        };
        Ok(self.objects()?.get(&key).map(|stored| stored.owner.clone()))
    }
}

fn extension_for(content_type: &Mime) -> &str {
    match content_type.subtype().as_str() {
        "jpeg" => "jpg",
        "svg+xml" => "svg",
        other => other,
    }
}
