/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::task::JoinSet;

use tbox::{Backend, TboxError, CHUNK_SIZE};

use crate::{
    item::StoreItem,
    path::DavPath,
    upload::{UploadRegistry, UploadSession, MAX_UPLOAD_WORKERS},
    StoreError,
};

/// Retries for idempotent backend calls on transient failures.
const BACKEND_RETRIES: u32 = 3;

/// How PROPFIND `Depth: infinity` is treated for collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfiniteDepthMode {
    Allowed,
    Rejected,
    Assume0,
    Assume1,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadOutcome {
    pub bytes_written: u64,
    pub parts: u32,
    /// True when an earlier interrupted PUT of the same path was
    /// resumed rather than restarted.
    pub resumed: bool,
}

/// Pure adapter between the DAV layer and the remote service. No
/// business rules live here beyond name validation.
pub struct TboxStore {
    backend: Arc<dyn Backend>,
    uploads: UploadRegistry,
    pub infinite_depth_mode: InfiniteDepthMode,
}

type PartResult = (u32, Vec<u8>, tbox::Result<()>);

impl TboxStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        TboxStore {
            backend,
            uploads: UploadRegistry::default(),
            infinite_depth_mode: InfiniteDepthMode::Allowed,
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub async fn get_item(&self, path: &DavPath) -> crate::Result<Option<StoreItem>> {
        let info = self
            .with_retry(|| self.backend.get_item(path.as_key()))
            .await?;
        Ok(info.map(StoreItem::from_object))
    }

    pub async fn get_child(
        &self,
        parent: &DavPath,
        name: &str,
    ) -> crate::Result<Option<StoreItem>> {
        self.get_item(&parent.child(name)?).await
    }

    /// Children in the order the service lists them.
    pub async fn get_children(&self, path: &DavPath) -> crate::Result<Vec<StoreItem>> {
        let items = self
            .with_retry(|| self.backend.list_items(path.as_key()))
            .await?;
        Ok(items.into_iter().map(StoreItem::from_object).collect())
    }

    pub async fn create_collection(&self, path: &DavPath) -> crate::Result<()> {
        self.with_retry(|| self.backend.create_directory(path.as_key()))
            .await?;
        Ok(())
    }

    /// Creates missing ancestors from the root down. The service's
    /// `SameNameDirectoryOrFileExists` answer counts as success, even
    /// when the existing entry is a file.
    pub async fn ensure_directory_exists(&self, path: &DavPath) -> crate::Result<()> {
        if path.is_root() {
            return Ok(());
        }
        let key = path.as_key();
        let mut offset = 0;
        loop {
            let prefix = match key[offset..].find('/') {
                Some(sep) => &key[..offset + sep],
                None => key,
            };
            match self
                .with_retry(|| self.backend.create_directory(prefix))
                .await
            {
                Ok(()) => {}
                Err(err) if err.is_same_name_exists() => {}
                Err(err) => return Err(err.into()),
            }
            if prefix.len() == key.len() {
                return Ok(());
            }
            offset = prefix.len() + 1;
        }
    }

    pub async fn delete(&self, path: &DavPath) -> crate::Result<()> {
        self.with_retry(|| self.backend.delete_item(path.as_key()))
            .await?;
        self.uploads.discard(path.as_key());
        self.uploads.discard_subtree(path.as_key());
        Ok(())
    }

    pub fn supports_fast_move(&self) -> bool {
        self.backend.supports_rename()
    }

    /// Server-side rename without copying.
    pub async fn rename(&self, from: &DavPath, to: &DavPath) -> crate::Result<()> {
        self.with_retry(|| self.backend.move_item(from.as_key(), to.as_key()))
            .await?;
        self.uploads.discard(from.as_key());
        self.uploads.discard_subtree(from.as_key());
        Ok(())
    }

    pub async fn read(
        &self,
        path: &DavPath,
        range: Option<(u64, u64)>,
    ) -> crate::Result<Vec<u8>> {
        Ok(self
            .with_retry(|| self.backend.read_object(path.as_key(), range))
            .await?)
    }

    /// Writes a fully buffered object through the chunk upload API.
    pub async fn write(&self, path: &DavPath, data: Vec<u8>) -> crate::Result<UploadOutcome> {
        let size = data.len() as u64;
        let stream =
            futures_util::stream::iter([Ok::<_, std::convert::Infallible>(Bytes::from(data))]);
        self.upload_from_stream(path, size, stream).await
    }

    /// Streams a request body into a resumable chunked upload. A failed
    /// attempt parks its session so the next PUT of the same path and
    /// size resumes with renewed credentials.
    pub async fn upload_from_stream<S, E>(
        &self,
        path: &DavPath,
        size: u64,
        stream: S,
    ) -> crate::Result<UploadOutcome>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        self.ensure_directory_exists(&path.parent()).await?;
        let mut session = self.uploads.take_or_init(path.as_key(), size);
        match self.drive_upload(&mut session, size, stream).await {
            Ok(outcome) => {
                self.uploads.discard(path.as_key());
                Ok(outcome)
            }
            Err(err) => {
                session.fail();
                self.uploads.park(session);
                Err(err)
            }
        }
    }

    async fn drive_upload<S, E>(
        &self,
        session: &mut UploadSession,
        size: u64,
        mut stream: S,
    ) -> crate::Result<UploadOutcome>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        session.prepare(self.backend.as_ref()).await?;

        let mut crc = crc64fast::Digest::new();
        let mut workers: JoinSet<PartResult> = JoinSet::new();
        let mut buffer = Vec::with_capacity(CHUNK_SIZE.min(size.max(1)) as usize);
        let mut part = 0u32;
        let mut received = 0u64;

        loop {
            match stream.next().await {
                Some(Ok(bytes)) => {
                    crc.write(&bytes);
                    received += bytes.len() as u64;
                    if received > size {
                        return Err(StoreError::Cancelled);
                    }
                    buffer.extend_from_slice(&bytes);
                    while buffer.len() >= CHUNK_SIZE as usize {
                        let rest = buffer.split_off(CHUNK_SIZE as usize);
                        let chunk = std::mem::replace(&mut buffer, rest);
                        part += 1;
                        self.dispatch_part(session, &mut workers, part, chunk)
                            .await?;
                    }
                }
                Some(Err(_)) => return Err(StoreError::Cancelled),
                None => break,
            }
        }

        if received != size {
            return Err(StoreError::Cancelled);
        }
        if !buffer.is_empty() {
            part += 1;
            self.dispatch_part(session, &mut workers, part, std::mem::take(&mut buffer))
                .await?;
        }
        while let Some(joined) = workers.join_next().await {
            self.settle_part(session, &mut workers, joined).await?;
        }

        session
            .confirm(self.backend.as_ref(), Some(crc.sum64()))
            .await?;

        Ok(UploadOutcome {
            bytes_written: received,
            parts: session.chunk_count(),
            resumed: session.was_resumed(),
        })
    }

    async fn dispatch_part(
        &self,
        session: &mut UploadSession,
        workers: &mut JoinSet<PartResult>,
        part: u32,
        bytes: Vec<u8>,
    ) -> crate::Result<()> {
        // On resume, parts the backend already acknowledged are skipped
        if !session.is_pending(part) {
            return Ok(());
        }
        while workers.len() >= MAX_UPLOAD_WORKERS {
            if let Some(joined) = workers.join_next().await {
                self.settle_part(session, workers, joined).await?;
            }
        }
        self.spawn_part(session, workers, part, bytes).await
    }

    async fn spawn_part(
        &self,
        session: &mut UploadSession,
        workers: &mut JoinSet<PartResult>,
        part: u32,
        bytes: Vec<u8>,
    ) -> crate::Result<()> {
        let credential = session
            .ensure_no_expire(self.backend.as_ref(), part)
            .await?;
        session.mark_in_flight(part);
        let backend = self.backend.clone();
        workers.spawn(async move {
            let result = backend.upload_chunk(&credential, &bytes).await;
            (part, bytes, result)
        });
        Ok(())
    }

    async fn settle_part(
        &self,
        session: &mut UploadSession,
        workers: &mut JoinSet<PartResult>,
        joined: Result<PartResult, tokio::task::JoinError>,
    ) -> crate::Result<()> {
        let (part, bytes, result) = joined.map_err(|err| {
            StoreError::Backend(TboxError::permanent(
                "UploadWorkerFailed",
                err.to_string(),
            ))
        })?;
        match result {
            Ok(()) => {
                session.complete_part(part);
                Ok(())
            }
            Err(err) if err.is_transient() => {
                if session.requeue_part(part) {
                    self.spawn_part(session, workers, part, bytes).await
                } else {
                    Err(err.into())
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn with_retry<T, F, Fut>(&self, call: F) -> tbox::Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = tbox::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(err) if err.is_transient() && attempt + 1 < BACKEND_RETRIES => {
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(50 << attempt)).await;
                }
                other => return other,
            }
        }
    }
}
