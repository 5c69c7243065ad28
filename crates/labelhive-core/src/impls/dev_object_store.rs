//! Dev implementation of the upload-authorization port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use crate::domain::RequesterId;
use crate::error::MarketError;
use crate::ports::{Clock, MAX_UPLOAD_BYTES, UPLOAD_TTL_SECS, UploadAuthorizer, UploadGrant};

/// Hands out grant-shaped URLs against a fake bucket.
///
/// The key embeds the requester and a random component so concurrent
/// uploads never collide.
pub struct DevUploadAuthorizer {
    bucket: String,
    clock: Arc<dyn Clock>,
}

impl DevUploadAuthorizer {
    pub fn new(bucket: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bucket: bucket.into(),
            clock,
        }
    }
}

#[async_trait]
impl UploadAuthorizer for DevUploadAuthorizer {
    async fn authorize(&self, requester: RequesterId) -> Result<UploadGrant, MarketError> {
        let nonce: u64 = rand::random();
        let key = format!("uploads/{requester}/{nonce:016x}/image.jpg");
        let expires_at = self.clock.now() + Duration::seconds(UPLOAD_TTL_SECS);

        Ok(UploadGrant {
            url: format!("https://{}.objects.invalid/{key}", self.bucket),
            key,
            max_bytes: MAX_UPLOAD_BYTES,
            expires_at,
        })
    }
}
