/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Mutex;

use ahash::AHashMap;
use dav_proto::{
    schema::{
        property::{ActiveLock, LockDiscovery, LockScope, SupportedLock, WebDavProperty},
        request::{DavPropertyValue, DeadProperty, LockInfo},
        response::{BaseCondition, Href, List, PropResponse},
    },
    Depth, RequestHeaders, Timeout,
};
use http_proto::HttpResponse;
use hyper::StatusCode;
use store::path::encode_href;
use tbox::now_unix;

use crate::{common::uri::DavUriResource, DavError, DavErrorCondition, DavServer};

/// Largest accepted `<D:owner>` fragment.
const MAX_OWNER_SIZE: usize = 512;

pub(crate) enum LockRequest {
    Lock(LockInfo),
    Refresh,
    Unlock,
}

pub(crate) enum LockCheck {
    Ok,
    Locked { root: String },
}

/// Process wide in-memory lock table, keyed by canonical path. All
/// operations are synchronous and never suspend; expiry is evaluated
/// lazily on every access.
pub struct LockManager {
    locks: Mutex<AHashMap<String, Vec<HeldLock>>>,
    max_timeout: u64,
}

#[derive(Clone)]
struct HeldLock {
    token: String,
    scope: LockScope,
    depth_infinity: bool,
    owner: Option<DeadProperty>,
    timeout: u64,
    created: i64,
}

/// A lock as observed at one point in time.
#[derive(Clone, Debug)]
pub struct LockSnapshot {
    pub token: String,
    pub scope: LockScope,
    pub depth_infinity: bool,
    pub owner: Option<DeadProperty>,
    pub remaining: u64,
    pub root: String,
}

impl HeldLock {
    fn expired(&self, now: i64) -> bool {
        self.created + self.timeout as i64 <= now
    }

    fn snapshot(&self, root: &str, now: i64) -> LockSnapshot {
        LockSnapshot {
            token: self.token.clone(),
            scope: self.scope,
            depth_infinity: self.depth_infinity,
            owner: self.owner.clone(),
            remaining: (self.created + self.timeout as i64 - now).max(0) as u64,
            root: root.to_string(),
        }
    }
}

impl LockManager {
    pub fn new(max_timeout: u64) -> Self {
        LockManager {
            locks: Mutex::new(AHashMap::new()),
            max_timeout,
        }
    }

    /// First timeout entry the server honours, capped to the maximum.
    fn select_timeout(&self, timeouts: &[Timeout]) -> u64 {
        match timeouts.first() {
            Some(Timeout::Second(seconds)) => (*seconds).min(self.max_timeout),
            Some(Timeout::Infinite) | None => self.max_timeout,
        }
    }

    pub fn lock(
        &self,
        path: &str,
        scope: LockScope,
        owner: Option<DeadProperty>,
        depth_infinity: bool,
        timeouts: &[Timeout],
    ) -> std::result::Result<LockSnapshot, String> {
        let now = now_unix();
        let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());
        prune(&mut locks, now);

        // A conflicting lock is one whose coverage overlaps the new
        // lock's coverage, unless both are shared.
        for (key, held) in locks.iter() {
            for lock in held {
                let overlaps = key == path
                    || (lock.depth_infinity && is_ancestor(key, path))
                    || (depth_infinity && is_ancestor(path, key));
                if overlaps
                    && (scope == LockScope::Exclusive || lock.scope == LockScope::Exclusive)
                {
                    return Err(key.clone());
                }
            }
        }

        let lock = HeldLock {
            token: format!("opaquelocktoken:{}", uuid::Uuid::new_v4()),
            scope,
            depth_infinity,
            owner,
            timeout: self.select_timeout(timeouts),
            created: now,
        };
        let snapshot = lock.snapshot(path, now);
        locks.entry(path.to_string()).or_default().push(lock);
        Ok(snapshot)
    }

    /// Resets the timer of the lock identified by `token`. The token
    /// must belong to a lock covering `path`.
    pub fn refresh(&self, path: &str, token: &str, timeouts: &[Timeout]) -> Option<LockSnapshot> {
        let now = now_unix();
        let timeout = self.select_timeout(timeouts);
        let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());
        prune(&mut locks, now);

        for (key, held) in locks.iter_mut() {
            if key != path && !(is_ancestor(key, path)) {
                continue;
            }
            for lock in held.iter_mut() {
                if lock.token == token && (key == path || lock.depth_infinity) {
                    lock.created = now;
                    lock.timeout = timeout;
                    return Some(lock.snapshot(key, now));
                }
            }
        }
        None
    }

    pub fn unlock(&self, path: &str, token: &str) -> bool {
        let now = now_unix();
        let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());
        prune(&mut locks, now);

        if let Some(held) = locks.get_mut(path) {
            let before = held.len();
            held.retain(|lock| lock.token != token);
            let removed = held.len() != before;
            if held.is_empty() {
                locks.remove(path);
            }
            removed
        } else {
            false
        }
    }

    /// Asserts that the caller holds a token for every lock standing in
    /// the way of a mutation of `path`.
    pub(crate) fn validate(
        &self,
        path: &str,
        tokens: &[&str],
        include_descendants: bool,
    ) -> LockCheck {
        let now = now_unix();
        let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());
        prune(&mut locks, now);

        for (key, held) in locks.iter() {
            let infinity_only = if key == path
                || (include_descendants && is_ancestor(path, key))
            {
                false
            } else if is_ancestor(key, path) {
                true
            } else {
                continue;
            };
            let mut applicable = held
                .iter()
                .filter(|lock| !infinity_only || lock.depth_infinity)
                .peekable();
            if applicable.peek().is_none() {
                continue;
            }
            if !applicable.any(|lock| tokens.iter().any(|token| *token == lock.token)) {
                return LockCheck::Locked { root: key.clone() };
            }
        }
        LockCheck::Ok
    }

    /// Locks that apply to `path`, feeding `lockdiscovery`.
    pub fn active_locks(&self, path: &str) -> Vec<LockSnapshot> {
        let now = now_unix();
        let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());
        prune(&mut locks, now);

        let mut snapshots = Vec::new();
        for (key, held) in locks.iter() {
            if key == path {
                snapshots.extend(held.iter().map(|lock| lock.snapshot(key, now)));
            } else if is_ancestor(key, path) {
                snapshots.extend(
                    held.iter()
                        .filter(|lock| lock.depth_infinity)
                        .map(|lock| lock.snapshot(key, now)),
                );
            }
        }
        snapshots
    }

    /// Drops every lock held on `path` and its subtree; used when the
    /// resource is deleted or moved away.
    pub fn remove_resource(&self, path: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());
        locks.retain(|key, _| key != path && !is_ancestor(path, key));
    }

    pub fn supported_locks(&self) -> SupportedLock {
        SupportedLock::default()
    }
}

fn prune(locks: &mut AHashMap<String, Vec<HeldLock>>, now: i64) {
    locks.retain(|_, held| {
        held.retain(|lock| !lock.expired(now));
        !held.is_empty()
    });
}

fn is_ancestor(ancestor: &str, key: &str) -> bool {
    ancestor.is_empty() && !key.is_empty()
        || key
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl LockSnapshot {
    pub fn to_active_lock(&self) -> ActiveLock {
        ActiveLock::new(encode_href(&self.root, false), self.scope)
            .with_depth(if self.depth_infinity {
                Depth::Infinity
            } else {
                Depth::Zero
            })
            .with_timeout(self.remaining)
            .with_owner_opt(self.owner.clone())
            .with_lock_token(self.token.clone())
    }
}

pub(crate) trait LockRequestHandler: Sync + Send {
    fn handle_lock_request(
        &self,
        headers: &RequestHeaders<'_>,
        request: LockRequest,
    ) -> impl std::future::Future<Output = crate::Result<HttpResponse>> + Send;
}

impl LockRequestHandler for DavServer {
    async fn handle_lock_request(
        &self,
        headers: &RequestHeaders<'_>,
        request: LockRequest,
    ) -> crate::Result<HttpResponse> {
        let path = self.validate_uri(headers.uri)?;

        match request {
            LockRequest::Unlock => {
                let token = headers
                    .lock_token
                    .ok_or(DavError::Code(StatusCode::BAD_REQUEST))?;
                if self.locks.unlock(path.as_key(), token) {
                    Ok(HttpResponse::new(StatusCode::NO_CONTENT))
                } else {
                    Err(DavErrorCondition::new(
                        StatusCode::CONFLICT,
                        BaseCondition::LockTokenMatchesRequestUri,
                    )
                    .into())
                }
            }
            LockRequest::Refresh => {
                let token = headers
                    .submitted_state_tokens()
                    .next()
                    .ok_or(DavError::Code(StatusCode::PRECONDITION_FAILED))?;
                match self
                    .locks
                    .refresh(path.as_key(), token, &headers.timeouts)
                {
                    Some(lock) => Ok(lock_response(&lock)),
                    None => Err(DavError::Code(StatusCode::PRECONDITION_FAILED)),
                }
            }
            LockRequest::Lock(lock_info) => {
                let depth_infinity = match headers.depth {
                    Depth::Zero => false,
                    Depth::One => return Err(DavError::Code(StatusCode::BAD_REQUEST)),
                    Depth::Infinity | Depth::None => true,
                };
                if lock_info
                    .owner
                    .as_ref()
                    .is_some_and(|owner| owner.size() > MAX_OWNER_SIZE)
                {
                    return Err(DavError::Code(StatusCode::PAYLOAD_TOO_LARGE));
                }

                match self.locks.lock(
                    path.as_key(),
                    lock_info.lock_scope,
                    lock_info.owner,
                    depth_infinity,
                    &headers.timeouts,
                ) {
                    Ok(lock) => {
                        let token = lock.token.clone();
                        Ok(lock_response(&lock).with_lock_token(&token))
                    }
                    Err(root) => Err(DavErrorCondition::new(
                        StatusCode::LOCKED,
                        BaseCondition::NoConflictingLock(List(vec![Href(encode_href(
                            &root, false,
                        ))])),
                    )
                    .into()),
                }
            }
        }
    }
}

fn lock_response(lock: &LockSnapshot) -> HttpResponse {
    HttpResponse::new(StatusCode::OK).with_xml_body(
        PropResponse::new(vec![DavPropertyValue::new(
            WebDavProperty::LockDiscovery,
            LockDiscovery(List(vec![lock.to_active_lock()])),
        )])
        .to_string(),
    )
}
