/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod item;
pub mod path;
pub mod store;
pub mod upload;

use std::fmt::Display;

pub use item::{ItemMeta, StoreItem};
pub use path::DavPath;
pub use store::{InfiniteDepthMode, TboxStore, UploadOutcome};
pub use upload::{UploadSession, UploadState};

use tbox::TboxError;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Conflict,
    PreconditionFailed,
    Forbidden,
    BadName,
    Cancelled,
    Backend(TboxError),
}

impl From<TboxError> for StoreError {
    fn from(err: TboxError) -> Self {
        match err.kind {
            tbox::ErrorKind::NotFound => StoreError::NotFound,
            tbox::ErrorKind::AlreadyExists | tbox::ErrorKind::Conflict => StoreError::Conflict,
            tbox::ErrorKind::Forbidden => StoreError::Forbidden,
            tbox::ErrorKind::Cancelled => StoreError::Cancelled,
            _ => StoreError::Backend(err),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound => f.write_str("not found"),
            StoreError::Conflict => f.write_str("conflict"),
            StoreError::PreconditionFailed => f.write_str("precondition failed"),
            StoreError::Forbidden => f.write_str("forbidden"),
            StoreError::BadName => f.write_str("invalid name"),
            StoreError::Cancelled => f.write_str("cancelled"),
            StoreError::Backend(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for StoreError {}
