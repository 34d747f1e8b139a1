/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::collections::BTreeMap;
use std::sync::Mutex;

use ahash::AHashMap;
use tbox::{now_unix, Backend, ChunkUploadGrant, PartCredential, TboxError, CHUNK_SIZE};

/// Attempts per part before the session gives up.
pub const MAX_PART_ATTEMPTS: u32 = 3;
/// Attempts to renew expiring credentials.
pub const RENEW_ATTEMPTS: u32 = 2;
/// Parts renewed per renewal call.
pub const RENEW_BATCH: usize = 50;
/// Credentials closer than this to expiry are renewed before use.
pub const EXPIRE_MARGIN: i64 = 30;
/// Concurrent part uploads per session.
pub const MAX_UPLOAD_WORKERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    NotInit,
    ConfirmKeyInit,
    Ready,
    Uploading,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPart {
    Part(u32),
    Waiting,
    Done,
}

#[derive(Default)]
struct PartState {
    in_flight: bool,
    attempts: u32,
}

/// One resumable chunked upload toward the backend. Workers only push
/// bytes; every other mutation happens on the coordinating task.
pub struct UploadSession {
    path: String,
    size: u64,
    chunk_count: u32,
    state: UploadState,
    confirm_key: Option<String>,
    grant: Option<ChunkUploadGrant>,
    remain: BTreeMap<u32, PartState>,
    resumed: bool,
}

impl UploadSession {
    pub fn init(path: impl Into<String>, size: u64) -> Self {
        UploadSession {
            path: path.into(),
            size,
            chunk_count: size.div_ceil(CHUNK_SIZE) as u32,
            state: UploadState::NotInit,
            confirm_key: None,
            grant: None,
            remain: BTreeMap::new(),
            resumed: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn was_resumed(&self) -> bool {
        self.resumed
    }

    /// Re-enters the session after a failed attempt, keeping the
    /// confirm key and the set of unacknowledged parts.
    pub fn resume(&mut self) {
        self.state = UploadState::ConfirmKeyInit;
        self.resumed = true;
        for part in self.remain.values_mut() {
            part.in_flight = false;
            part.attempts = 0;
        }
    }

    pub async fn prepare(&mut self, backend: &dyn Backend) -> tbox::Result<()> {
        match self.state {
            UploadState::NotInit | UploadState::Error => {
                let grant = backend
                    .start_chunk_upload(&self.path, self.chunk_count)
                    .await?;
                self.confirm_key = Some(grant.confirm_key.clone());
                self.grant = Some(grant);
                self.remain = (1..=self.chunk_count)
                    .map(|part| (part, PartState::default()))
                    .collect();
                self.state = UploadState::Ready;
            }
            UploadState::ConfirmKeyInit => {
                let confirm_key = self.confirm_key()?.to_string();
                let parts = self
                    .remain
                    .keys()
                    .copied()
                    .take(RENEW_BATCH)
                    .collect::<Vec<_>>();
                let grant = backend.renew_chunk_upload(&confirm_key, &parts).await?;
                self.grant = Some(grant);
                self.state = UploadState::Ready;
            }
            UploadState::Ready | UploadState::Uploading | UploadState::Done => {}
        }
        Ok(())
    }

    /// The first part that is neither uploaded nor in flight. `Waiting`
    /// means every pending part is currently being pushed.
    pub fn next_part(&mut self) -> NextPart {
        if self.remain.is_empty() {
            return NextPart::Done;
        }
        for (&number, part) in self.remain.iter_mut() {
            if !part.in_flight {
                part.in_flight = true;
                self.state = UploadState::Uploading;
                return NextPart::Part(number);
            }
        }
        NextPart::Waiting
    }

    /// Returns a usable credential for `part`, renewing the grant when
    /// it is about to expire or does not cover the part.
    pub async fn ensure_no_expire(
        &mut self,
        backend: &dyn Backend,
        part: u32,
    ) -> tbox::Result<PartCredential> {
        for attempt in 0..RENEW_ATTEMPTS {
            if let Some(grant) = &self.grant {
                if grant.expiration - now_unix() >= EXPIRE_MARGIN {
                    if let Some(credential) = grant.parts.get(&part) {
                        return Ok(credential.clone());
                    }
                }
            }

            let confirm_key = self.confirm_key()?.to_string();
            let mut parts = Vec::with_capacity(RENEW_BATCH);
            parts.push(part);
            parts.extend(
                self.remain
                    .keys()
                    .copied()
                    .filter(|&number| number != part)
                    .take(RENEW_BATCH - 1),
            );
            match backend.renew_chunk_upload(&confirm_key, &parts).await {
                Ok(grant) => self.grant = Some(grant),
                Err(err) if err.is_transient() && attempt + 1 < RENEW_ATTEMPTS => continue,
                Err(err) => return Err(err),
            }
        }

        self.grant
            .as_ref()
            .and_then(|grant| grant.parts.get(&part))
            .cloned()
            .ok_or_else(|| {
                TboxError::permanent(
                    "MissingPartCredential",
                    format!("renewal did not cover part {part}"),
                )
            })
    }

    pub fn is_pending(&self, part: u32) -> bool {
        self.remain.contains_key(&part)
    }

    pub fn mark_in_flight(&mut self, part: u32) {
        if let Some(state) = self.remain.get_mut(&part) {
            state.in_flight = true;
        }
        self.state = UploadState::Uploading;
    }

    /// Removes a part after the backend acknowledged it.
    pub fn complete_part(&mut self, part: u32) {
        self.remain.remove(&part);
    }

    /// Puts a failed part back in the queue. Returns false once its
    /// attempts are exhausted, leaving the session in `Error`.
    pub fn requeue_part(&mut self, part: u32) -> bool {
        match self.remain.get_mut(&part) {
            Some(state) => {
                state.attempts += 1;
                if state.attempts >= MAX_PART_ATTEMPTS {
                    self.state = UploadState::Error;
                    false
                } else {
                    state.in_flight = false;
                    true
                }
            }
            None => false,
        }
    }

    pub async fn confirm(&mut self, backend: &dyn Backend, crc64: Option<u64>) -> tbox::Result<()> {
        if !self.remain.is_empty() {
            return Err(TboxError::permanent(
                "IncompleteUpload",
                format!("{} parts still pending", self.remain.len()),
            ));
        }
        let confirm_key = self.confirm_key()?.to_string();
        backend.confirm_upload(&confirm_key, crc64).await?;
        self.state = UploadState::Done;
        Ok(())
    }

    /// Parks the session after a failure; the confirm key survives so a
    /// repeated PUT can resume where this one stopped.
    pub fn fail(&mut self) {
        self.state = UploadState::Error;
        for part in self.remain.values_mut() {
            part.in_flight = false;
        }
    }

    pub fn can_resume(&self) -> bool {
        self.state == UploadState::Error && self.confirm_key.is_some()
    }

    fn confirm_key(&self) -> tbox::Result<&str> {
        self.confirm_key.as_deref().ok_or_else(|| {
            TboxError::permanent("NoConfirmKey", "session was never prepared")
        })
    }
}

/// Failed sessions parked by path so a client retrying the same PUT
/// resumes instead of restarting.
#[derive(Default)]
pub(crate) struct UploadRegistry {
    inner: Mutex<AHashMap<String, UploadSession>>,
}

impl UploadRegistry {
    /// Takes ownership of the session for `path`, resuming a parked one
    /// when its size matches.
    pub fn take_or_init(&self, path: &str, size: u64) -> UploadSession {
        let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        if let Some(mut session) = inner.remove(path) {
            if session.size == size && session.can_resume() {
                session.resume();
                return session;
            }
        }
        UploadSession::init(path, size)
    }

    pub fn park(&self, session: UploadSession) {
        if session.can_resume() {
            let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
            inner.insert(session.path.clone(), session);
        }
    }

    pub fn discard(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        inner.remove(path);
    }

    pub fn discard_subtree(&self, path: &str) {
        let prefix = format!("{path}/");
        let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        inner.retain(|key, _| key != path && !key.starts_with(&prefix));
    }
}
