/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod common;
pub mod file;
pub mod property;
pub mod request;

use std::sync::Arc;

use dav_proto::schema::{
    request::DavPropertyValue,
    response::{Condition, List, Prop, PropStat, Status},
};
use hyper::{Method, StatusCode};
use store::{StoreError, TboxStore};
use tbox::Backend;

use crate::{common::lock::LockManager, property::PropertyManager};

pub(crate) type Result<T> = std::result::Result<T, DavError>;

/// Upper bound on honoured lock timeouts, in seconds.
pub const MAX_LOCK_TIMEOUT: u64 = 600;

/// Cap for XML request bodies; PUT payloads stream and are not bound
/// by this.
pub const MAX_XML_BODY_SIZE: usize = 512 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavMethod {
    GET,
    HEAD,
    PUT,
    DELETE,
    OPTIONS,
    PROPFIND,
    PROPPATCH,
    MKCOL,
    COPY,
    MOVE,
    LOCK,
    UNLOCK,
}

impl DavMethod {
    pub fn parse(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(DavMethod::GET),
            Method::HEAD => Some(DavMethod::HEAD),
            Method::PUT => Some(DavMethod::PUT),
            Method::DELETE => Some(DavMethod::DELETE),
            Method::OPTIONS => Some(DavMethod::OPTIONS),
            _ => {
                hashify::tiny_map!(method.as_str().as_bytes(),
                    "PROPFIND" => DavMethod::PROPFIND,
                    "PROPPATCH" => DavMethod::PROPPATCH,
                    "MKCOL" => DavMethod::MKCOL,
                    "COPY" => DavMethod::COPY,
                    "MOVE" => DavMethod::MOVE,
                    "LOCK" => DavMethod::LOCK,
                    "UNLOCK" => DavMethod::UNLOCK,
                )
            }
        }
    }

    #[inline]
    pub fn has_body(self) -> bool {
        matches!(
            self,
            DavMethod::PUT | DavMethod::PROPFIND | DavMethod::PROPPATCH | DavMethod::LOCK
        )
    }

    #[inline]
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            DavMethod::PUT
                | DavMethod::DELETE
                | DavMethod::PROPPATCH
                | DavMethod::MKCOL
                | DavMethod::COPY
                | DavMethod::MOVE
                | DavMethod::LOCK
                | DavMethod::UNLOCK
        )
    }
}

/// The protocol engine: store adapter, lock table and property system,
/// shared across request tasks.
pub struct DavServer {
    pub store: TboxStore,
    pub locks: LockManager,
    pub properties: PropertyManager,
    pub config: DavConfig,
}

#[derive(Debug, Clone)]
pub struct DavConfig {
    pub max_lock_timeout: u64,
    pub read_only: bool,
    pub max_xml_size: usize,
    pub infinite_depth_mode: store::InfiniteDepthMode,
}

impl Default for DavConfig {
    fn default() -> Self {
        DavConfig {
            max_lock_timeout: MAX_LOCK_TIMEOUT,
            read_only: false,
            max_xml_size: MAX_XML_BODY_SIZE,
            infinite_depth_mode: store::InfiniteDepthMode::Allowed,
        }
    }
}

impl DavServer {
    pub fn new(backend: Arc<dyn Backend>, config: DavConfig) -> Self {
        let mut store = TboxStore::new(backend);
        store.infinite_depth_mode = config.infinite_depth_mode;
        DavServer {
            store,
            locks: LockManager::new(config.max_lock_timeout),
            properties: PropertyManager::new(),
            config,
        }
    }
}

pub(crate) enum DavError {
    Parse(dav_proto::parser::Error),
    Store(StoreError),
    Condition(DavErrorCondition),
    Code(StatusCode),
}

pub(crate) struct DavErrorCondition {
    pub code: StatusCode,
    pub condition: Condition,
}

impl DavErrorCondition {
    pub fn new(code: StatusCode, condition: impl Into<Condition>) -> Self {
        DavErrorCondition {
            code,
            condition: condition.into(),
        }
    }
}

impl From<DavErrorCondition> for DavError {
    fn from(value: DavErrorCondition) -> Self {
        DavError::Condition(value)
    }
}

impl From<dav_proto::parser::Error> for DavError {
    fn from(err: dav_proto::parser::Error) -> Self {
        DavError::Parse(err)
    }
}

impl From<StoreError> for DavError {
    fn from(err: StoreError) -> Self {
        DavError::Store(err)
    }
}

impl From<StatusCode> for DavError {
    fn from(code: StatusCode) -> Self {
        DavError::Code(code)
    }
}

/// Maps a per-child store failure into the status carried by its
/// `<D:response>` entry.
pub(crate) fn store_error_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
        StoreError::Forbidden => StatusCode::FORBIDDEN,
        StoreError::BadName => StatusCode::BAD_REQUEST,
        StoreError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
        StoreError::Backend(err) if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Groups properties by response status while preserving insertion
/// order of the status groups.
#[derive(Default)]
pub struct PropStatBuilder {
    propstats: Vec<(StatusCode, Vec<DavPropertyValue>)>,
}

impl PropStatBuilder {
    pub fn insert_ok(&mut self, prop: impl Into<DavPropertyValue>) -> &mut Self {
        self.insert_with_status(prop, StatusCode::OK)
    }

    pub fn insert_with_status(
        &mut self,
        prop: impl Into<DavPropertyValue>,
        status: StatusCode,
    ) -> &mut Self {
        if let Some((_, props)) = self
            .propstats
            .iter_mut()
            .find(|(code, _)| *code == status)
        {
            props.push(prop.into());
        } else {
            self.propstats.push((status, vec![prop.into()]));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.propstats.is_empty()
    }

    pub fn build(self) -> Vec<PropStat> {
        self.propstats
            .into_iter()
            .map(|(status, props)| PropStat {
                prop: Prop(List(props)),
                status: Status(status),
                error: None,
                response_description: None,
            })
            .collect()
    }
}
