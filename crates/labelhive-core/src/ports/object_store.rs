//! Object-storage port: pre-signed upload authorization.
//!
//! The core never touches image bytes. Requesters upload directly to the
//! object store with a time-boxed, size-bounded grant, and the core only
//! ever stores the resulting stable URL as an option's image reference.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RequesterId;
use crate::error::MarketError;

/// Upper bound on a single uploaded image (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Lifetime of an upload grant.
pub const UPLOAD_TTL_SECS: i64 = 3600;

/// A time-boxed authorization to upload one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadGrant {
    /// Where to send the upload.
    pub url: String,

    /// Object key the upload must use; doubles as the stable image
    /// reference once the upload finishes.
    pub key: String,

    pub max_bytes: u64,
    pub expires_at: DateTime<Utc>,
}

/// Issues pre-signed upload grants.
#[async_trait]
pub trait UploadAuthorizer: Send + Sync {
    async fn authorize(&self, requester: RequesterId) -> Result<UploadGrant, MarketError>;
}
