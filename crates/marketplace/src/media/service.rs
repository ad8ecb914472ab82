use std::sync::Arc;

use axum::body::Bytes;
use mime::Mime;
use serde::Serialize;
use tracing::{info, warn};

use super::store::{MediaError, MediaStore, StoredMedia};
use crate::access::{require_role, Caller, VENDOR_OR_ADMIN};
use crate::error::ServiceError;
use crate::identity::domain::UserId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaObject {
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// Image uploads for product listings.
pub struct MediaService {
    store: Arc<dyn MediaStore>,
}

impl MediaService {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    pub fn upload(
        &self,
        caller: &Caller,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<MediaObject, ServiceError> {
        require_role(caller, VENDOR_OR_ADMIN)?;

        let content_type: Mime = content_type
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| ServiceError::validation("a content type is required"))?;
        if content_type.type_() != mime::IMAGE {
            return Err(ServiceError::validation("only image uploads are accepted"));
        }
        if bytes.is_empty() {
            return Err(ServiceError::validation("upload body is empty"));
        }

        let size = bytes.len();
        let url = self
            .store
            .put(&caller.user_id, &content_type, bytes)
            .map_err(|err| ServiceError::Internal(err.to_string()))?;
        info!(%url, size, uploader = %caller.user_id.0, "media uploaded");

        Ok(MediaObject {
            url,
            content_type: content_type.essence_str().to_string(),
            size,
        })
    }

    pub fn fetch(&self, key: &str) -> Result<StoredMedia, ServiceError> {
        self.store
            .get(key)
            .map_err(|err| ServiceError::Internal(err.to_string()))?
            .ok_or_else(|| ServiceError::not_found("media not found"))
    }

    /// Every URL must name an upload made by `owner`.
    pub fn ensure_owned(&self, owner: &UserId, urls: &[String]) -> Result<(), ServiceError> {
        for url in urls {
            match self.owner_of(url)? {
                Some(uploader) if &uploader == owner => {}
                Some(_) => {
                    return Err(ServiceError::forbidden(
                        "images must be uploaded by the listing's vendor",
                    ))
                }
                None => {
                    return Err(ServiceError::validation(format!(
                        "image {url} is not an uploaded file"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Best-effort release of images that are no longer referenced. Only objects uploaded
    /// by `owner` are removed.
    pub fn release(&self, owner: &UserId, urls: &[String]) {
        for url in urls {
            match self.owner_of(url) {
                Ok(Some(uploader)) if &uploader == owner => {}
                Ok(_) => continue,
                Err(err) => {
                    warn!(%url, error = %err, "failed to resolve media owner");
                    continue;
                }
            }
            match self.store.remove(url) {
                Ok(()) | Err(MediaError::NotFound) => {}
                Err(err) => warn!(%url, error = %err, "failed to release media"),
            }
        }
    }

    fn owner_of(&self, url: &str) -> Result<Option<UserId>, ServiceError> {
        self.store
            .owner_of(url)
            .map_err(|err| ServiceError::Internal(err.to_string()))
    }
}
