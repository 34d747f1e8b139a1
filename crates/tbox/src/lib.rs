/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod error;
pub mod memory;

use ahash::AHashMap;
use async_trait::async_trait;

pub use error::{ErrorKind, TboxError};

pub type Result<T> = std::result::Result<T, TboxError>;

/// Chunk size the backend slices uploads into.
pub const CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Metadata of a remote object as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Slash separated key, no leading or trailing slash.
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    /// Unix milliseconds.
    pub created: i64,
    /// Unix milliseconds.
    pub modified: i64,
    pub etag: String,
    pub mime_type: Option<String>,
}

/// Per-part upload credentials issued by `start_chunk_upload` and
/// refreshed by `renew_chunk_upload`.
#[derive(Debug, Clone)]
pub struct ChunkUploadGrant {
    pub confirm_key: String,
    pub parts: AHashMap<u32, PartCredential>,
    /// Unix seconds after which the credentials are no longer valid.
    pub expiration: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartCredential {
    pub part_number: u32,
    pub url: String,
    pub credential: String,
}

/// The remote object store the gateway fronts. The production client
/// speaks HTTP to the Tbox service; tests and the `mem` serving mode use
/// [`memory::MemoryBackend`].
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_item(&self, path: &str) -> Result<Option<ObjectInfo>>;

    /// Direct children of a directory, in the service's listing order.
    async fn list_items(&self, path: &str) -> Result<Vec<ObjectInfo>>;

    async fn create_directory(&self, path: &str) -> Result<()>;

    async fn delete_item(&self, path: &str) -> Result<()>;

    async fn move_item(&self, from: &str, to: &str) -> Result<()>;

    /// True when the service renames server side without copying.
    fn supports_rename(&self) -> bool;

    /// Reads object content; `range` is an inclusive byte range.
    async fn read_object(&self, path: &str, range: Option<(u64, u64)>) -> Result<Vec<u8>>;

    async fn start_chunk_upload(&self, path: &str, chunk_count: u32) -> Result<ChunkUploadGrant>;

    async fn renew_chunk_upload(
        &self,
        confirm_key: &str,
        parts: &[u32],
    ) -> Result<ChunkUploadGrant>;

    async fn upload_chunk(&self, part: &PartCredential, body: &[u8]) -> Result<()>;

    async fn confirm_upload(&self, confirm_key: &str, crc64: Option<u64>) -> Result<()>;
}

/// Credentials attached to outgoing backend calls. Renewal is driven by
/// the upload session when grants near expiry.
pub trait Credentials: Send + Sync {
    fn access_token(&self) -> String;
}

pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

pub fn now_unix_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
