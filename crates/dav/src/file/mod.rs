/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod copy_move;
pub mod delete;
pub mod get;
pub mod mkcol;
pub mod propfind;
pub mod proppatch;
pub mod update;

use hyper::StatusCode;
use store::{path::encode_href, DavPath, StoreItem};

use crate::{DavError, DavServer};

/// Href of an item, with the trailing slash collections carry.
pub(crate) fn item_href(item: &StoreItem) -> String {
    encode_href(item.full_path(), item.is_collection())
}

impl DavServer {
    /// Resolves a request path to an existing store item.
    pub(crate) async fn map_resource(&self, path: &DavPath) -> crate::Result<StoreItem> {
        self.store
            .get_item(path)
            .await?
            .ok_or(DavError::Code(StatusCode::NOT_FOUND))
    }

    /// Resolves the parent of a request path, which must be an existing
    /// collection for the target to be creatable.
    pub(crate) async fn map_parent(&self, path: &DavPath) -> crate::Result<StoreItem> {
        match self.store.get_item(&path.parent()).await? {
            Some(parent) if parent.is_collection() => Ok(parent),
            _ => Err(DavError::Code(StatusCode::CONFLICT)),
        }
    }
}
