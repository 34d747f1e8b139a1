/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use tbox::ObjectInfo;

pub const DIRECTORY_MIME_TYPE: &str = "httpd/unix-directory";
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Shared metadata of store entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMeta {
    /// Last path segment.
    pub name: String,
    /// Full storage key.
    pub full_path: String,
    /// Stable identity used by the lock manager. The service does not
    /// expose stable object ids, so this is derived from the path.
    pub unique_key: String,
    pub mime_type: String,
    pub size: u64,
    /// Unix milliseconds.
    pub created: i64,
    /// Unix milliseconds.
    pub modified: i64,
    pub etag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreItem {
    Item(ItemMeta),
    Collection(ItemMeta),
}

impl StoreItem {
    pub fn from_object(info: ObjectInfo) -> Self {
        let is_dir = info.is_dir;
        let name = info
            .path
            .rsplit_once('/')
            .map_or(info.path.as_str(), |(_, name)| name)
            .to_string();
        let meta = ItemMeta {
            name,
            unique_key: info.path.clone(),
            mime_type: if is_dir {
                DIRECTORY_MIME_TYPE.to_string()
            } else {
                info.mime_type
                    .filter(|mime| !mime.is_empty())
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
            },
            size: if is_dir { 0 } else { info.size },
            created: info.created,
            modified: info.modified,
            etag: info.etag,
            full_path: info.path,
        };
        if is_dir {
            StoreItem::Collection(meta)
        } else {
            StoreItem::Item(meta)
        }
    }

    pub fn meta(&self) -> &ItemMeta {
        match self {
            StoreItem::Item(meta) | StoreItem::Collection(meta) => meta,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, StoreItem::Collection(_))
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    pub fn full_path(&self) -> &str {
        &self.meta().full_path
    }

    pub fn unique_key(&self) -> &str {
        &self.meta().unique_key
    }

    pub fn size(&self) -> u64 {
        self.meta().size
    }

    pub fn etag(&self) -> &str {
        &self.meta().etag
    }
}
