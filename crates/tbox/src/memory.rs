/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use ahash::AHashMap;
use async_trait::async_trait;

use crate::{
    now_unix, now_unix_millis, Backend, ChunkUploadGrant, ErrorKind, ObjectInfo, PartCredential,
    Result, TboxError,
};

/// In-memory rendition of the Tbox service, used by the `mem` serving
/// mode and the test suite. Chunk uploads mint real grants so session
/// renewal and resume paths can be exercised.
pub struct MemoryBackend {
    state: Mutex<State>,
    grant_ttl: AtomicI64,
}

#[derive(Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    uploads: AHashMap<String, Upload>,
    fail_parts: AHashMap<u32, u32>,
    fail_deletes: Vec<String>,
    renewals: u32,
    seq: u64,
}

struct Entry {
    is_dir: bool,
    data: Vec<u8>,
    created: i64,
    modified: i64,
    seq: u64,
}

struct Upload {
    path: String,
    chunk_count: u32,
    parts: AHashMap<u32, Vec<u8>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            state: Mutex::new(State::default()),
            grant_ttl: AtomicI64::new(600),
        }
    }

    /// Makes the next `times` uploads of `part` fail with a transient
    /// error.
    pub fn fail_part_times(&self, part: u32, times: u32) {
        self.state.lock().unwrap().fail_parts.insert(part, times);
    }

    /// Shortens issued grants so sessions hit the renewal path.
    pub fn set_grant_ttl(&self, seconds: i64) {
        self.grant_ttl.store(seconds, Ordering::Relaxed);
    }

    /// Makes deletions of `path` fail with a permission error.
    pub fn fail_delete(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_deletes
            .push(path.to_string());
    }

    pub fn renewal_count(&self) -> u32 {
        self.state.lock().unwrap().renewals
    }

    fn info(path: &str, entry: &Entry) -> ObjectInfo {
        ObjectInfo {
            path: path.to_string(),
            is_dir: entry.is_dir,
            size: entry.data.len() as u64,
            created: entry.created,
            modified: entry.modified,
            etag: format!("\"{:x}-{:x}\"", entry.seq, entry.data.len()),
            mime_type: None,
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_item(&self, path: &str) -> Result<Option<ObjectInfo>> {
        if path.is_empty() {
            let now = now_unix_millis();
            return Ok(Some(ObjectInfo {
                path: String::new(),
                is_dir: true,
                size: 0,
                created: now,
                modified: now,
                etag: "\"root\"".to_string(),
                mime_type: None,
            }));
        }
        let state = self.state.lock().unwrap();
        Ok(state.entries.get(path).map(|entry| Self::info(path, entry)))
    }

    async fn list_items(&self, path: &str) -> Result<Vec<ObjectInfo>> {
        let state = self.state.lock().unwrap();
        if !path.is_empty() {
            match state.entries.get(path) {
                Some(entry) if entry.is_dir => {}
                Some(_) => {
                    return Err(TboxError::new(
                        ErrorKind::Conflict,
                        "NotADirectory",
                        format!("{path} is not a directory"),
                    ))
                }
                None => return Err(TboxError::not_found(path)),
            }
        }
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        Ok(state
            .entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .filter(|(key, _)| !key.is_empty() && key.as_str() != path)
            .map(|(key, entry)| Self::info(key, entry))
            .collect())
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.entries.contains_key(path) {
            return Err(TboxError::same_name_exists(path));
        }
        if let Some((parent, _)) = path.rsplit_once('/') {
            if !state.entries.get(parent).is_some_and(|e| e.is_dir) {
                return Err(TboxError::not_found(parent));
            }
        }
        let now = now_unix_millis();
        state.seq += 1;
        let seq = state.seq;
        state.entries.insert(
            path.to_string(),
            Entry {
                is_dir: true,
                data: Vec::new(),
                created: now,
                modified: now,
                seq,
            },
        );
        Ok(())
    }

    async fn delete_item(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes.iter().any(|failing| failing == path) {
            return Err(TboxError::forbidden(format!(
                "deletion of {path} is not permitted"
            )));
        }
        let Some(entry) = state.entries.remove(path) else {
            return Err(TboxError::not_found(path));
        };
        if entry.is_dir {
            let prefix = format!("{path}/");
            let children = state
                .entries
                .range(prefix.clone()..)
                .take_while(|(key, _)| key.starts_with(&prefix))
                .map(|(key, _)| key.clone())
                .collect::<Vec<_>>();
            for child in children {
                state.entries.remove(&child);
            }
        }
        Ok(())
    }

    async fn move_item(&self, from: &str, to: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.entries.contains_key(to) {
            return Err(TboxError::same_name_exists(to));
        }
        if let Some((parent, _)) = to.rsplit_once('/') {
            if !state.entries.get(parent).is_some_and(|e| e.is_dir) {
                return Err(TboxError::not_found(parent));
            }
        }
        let Some(entry) = state.entries.remove(from) else {
            return Err(TboxError::not_found(from));
        };
        let is_dir = entry.is_dir;
        state.entries.insert(to.to_string(), entry);
        if is_dir {
            let prefix = format!("{from}/");
            let children = state
                .entries
                .range(prefix.clone()..)
                .take_while(|(key, _)| key.starts_with(&prefix))
                .map(|(key, _)| key.clone())
                .collect::<Vec<_>>();
            for child in children {
                if let Some(entry) = state.entries.remove(&child) {
                    let renamed = format!("{to}/{}", &child[prefix.len()..]);
                    state.entries.insert(renamed, entry);
                }
            }
        }
        Ok(())
    }

    fn supports_rename(&self) -> bool {
        true
    }

    async fn read_object(&self, path: &str, range: Option<(u64, u64)>) -> Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        let entry = state.entries.get(path).ok_or(TboxError::not_found(path))?;
        match range {
            Some((from, to)) => {
                let from = from.min(entry.data.len() as u64) as usize;
                let to = ((to + 1).min(entry.data.len() as u64)) as usize;
                Ok(entry.data[from..to].to_vec())
            }
            None => Ok(entry.data.clone()),
        }
    }

    async fn start_chunk_upload(&self, path: &str, chunk_count: u32) -> Result<ChunkUploadGrant> {
        let mut state = self.state.lock().unwrap();
        state.seq += 1;
        let confirm_key = format!("ck-{:x}", state.seq);
        state.uploads.insert(
            confirm_key.clone(),
            Upload {
                path: path.to_string(),
                chunk_count,
                parts: AHashMap::new(),
            },
        );
        let parts = (1..=chunk_count)
            .map(|part| (part, part_credential(path, &confirm_key, part)))
            .collect();
        Ok(ChunkUploadGrant {
            confirm_key,
            parts,
            expiration: now_unix() + self.grant_ttl.load(Ordering::Relaxed),
        })
    }

    async fn renew_chunk_upload(
        &self,
        confirm_key: &str,
        parts: &[u32],
    ) -> Result<ChunkUploadGrant> {
        let mut state = self.state.lock().unwrap();
        let Some(upload) = state.uploads.get(confirm_key) else {
            return Err(TboxError::permanent(
                "UnknownConfirmKey",
                format!("no upload session for {confirm_key}"),
            ));
        };
        let path = upload.path.clone();
        state.renewals += 1;
        Ok(ChunkUploadGrant {
            confirm_key: confirm_key.to_string(),
            parts: parts
                .iter()
                .map(|&part| (part, part_credential(&path, confirm_key, part)))
                .collect(),
            expiration: now_unix() + self.grant_ttl.load(Ordering::Relaxed),
        })
    }

    async fn upload_chunk(&self, part: &PartCredential, body: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.fail_parts.get_mut(&part.part_number) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TboxError::transient("injected chunk failure"));
            }
        }
        let Some((confirm_key, _)) = part.credential.rsplit_once('.') else {
            return Err(TboxError::permanent("BadCredential", "malformed credential"));
        };
        let confirm_key = confirm_key.to_string();
        let Some(upload) = state.uploads.get_mut(&confirm_key) else {
            return Err(TboxError::permanent(
                "UnknownConfirmKey",
                format!("no upload session for {confirm_key}"),
            ));
        };
        upload.parts.insert(part.part_number, body.to_vec());
        Ok(())
    }

    async fn confirm_upload(&self, confirm_key: &str, _crc64: Option<u64>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let Some(upload) = state.uploads.remove(confirm_key) else {
            return Err(TboxError::permanent(
                "UnknownConfirmKey",
                format!("no upload session for {confirm_key}"),
            ));
        };
        let mut data = Vec::new();
        for part in 1..=upload.chunk_count {
            let Some(chunk) = upload.parts.get(&part) else {
                state.uploads.insert(confirm_key.to_string(), upload);
                return Err(TboxError::new(
                    ErrorKind::Conflict,
                    "IncompletePayload",
                    format!("part {part} was never uploaded"),
                ));
            };
            data.extend_from_slice(chunk);
        }
        let now = now_unix_millis();
        state.seq += 1;
        let seq = state.seq;
        let created = state
            .entries
            .get(&upload.path)
            .map(|e| e.created)
            .unwrap_or(now);
        state.entries.insert(
            upload.path,
            Entry {
                is_dir: false,
                data,
                created,
                modified: now,
                seq,
            },
        );
        Ok(())
    }
}

fn part_credential(path: &str, confirm_key: &str, part: u32) -> PartCredential {
    PartCredential {
        part_number: part,
        url: format!("memory://{path}#{part}"),
        credential: format!("{confirm_key}.{part}"),
    }
}
