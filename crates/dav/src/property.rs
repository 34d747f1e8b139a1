/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Mutex;

use ahash::AHashMap;
use dav_proto::schema::property::{
    DavProperty, DavValue, Iso8601DateTime, MsProperty, ResourceType, Rfc1123DateTime,
    WebDavProperty,
};
use dav_proto::schema::response::List;
use hyper::StatusCode;
use store::StoreItem;

use crate::common::lock::LockManager;

/// FILE_ATTRIBUTE_ARCHIVE / FILE_ATTRIBUTE_DIRECTORY, the defaults the
/// Windows client expects when nothing was stored.
const ATTRIBUTES_FILE: &str = "00000020";
const ATTRIBUTES_DIRECTORY: &str = "00000010";

pub struct PropertyDescriptor {
    pub property: DavProperty,
    pub is_expensive: bool,
    pub is_computed: bool,
    pub writable: bool,
}

/// Typed property table plus the overlay holding values written by
/// clients (the Windows `Win32*` attributes). Descriptors are fixed at
/// startup; the overlay is memory resident only.
pub struct PropertyManager {
    overlay: Mutex<AHashMap<(String, DavProperty), String>>,
}

impl Default for PropertyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyManager {
    pub fn new() -> Self {
        PropertyManager {
            overlay: Mutex::new(AHashMap::new()),
        }
    }

    /// Property descriptors applying to an item kind, in emission
    /// order.
    pub fn descriptors(is_collection: bool) -> Vec<PropertyDescriptor> {
        let mut descriptors = vec![
            live(WebDavProperty::CreationDate),
            live(WebDavProperty::DisplayName),
            live(WebDavProperty::GetContentType),
            live(WebDavProperty::GetETag),
            live(WebDavProperty::GetLastModified),
            live(WebDavProperty::ResourceType),
            live(WebDavProperty::LockDiscovery),
            live(WebDavProperty::SupportedLock),
            live(WebDavProperty::IsCollection),
            live(WebDavProperty::IsReadOnly),
        ];
        if !is_collection {
            descriptors.insert(2, live(WebDavProperty::GetContentLength));
        }
        descriptors.extend([
            win32(MsProperty::Win32CreationTime),
            win32(MsProperty::Win32LastAccessTime),
            win32(MsProperty::Win32LastModifiedTime),
            win32(MsProperty::Win32FileAttributes),
        ]);
        descriptors
    }

    /// Properties served by `allprop`; expensive ones must be asked
    /// for by name.
    pub fn all_props(&self, is_collection: bool) -> Vec<DavProperty> {
        Self::descriptors(is_collection)
            .into_iter()
            .filter(|descriptor| !descriptor.is_expensive)
            .map(|descriptor| descriptor.property)
            .collect()
    }

    pub fn prop_names(&self, is_collection: bool) -> Vec<DavProperty> {
        Self::descriptors(is_collection)
            .into_iter()
            .map(|descriptor| descriptor.property)
            .collect()
    }

    /// Resolves a property to its wire value. 404 marks properties
    /// unknown to this item, 500 a failing getter.
    pub fn get(
        &self,
        item: &StoreItem,
        locks: &LockManager,
        read_only: bool,
        property: &DavProperty,
    ) -> (DavValue, StatusCode) {
        if let Some(value) = self.overlay_get(item, property) {
            return (DavValue::String(value), StatusCode::OK);
        }

        let meta = item.meta();
        let value = match property {
            DavProperty::WebDav(prop) => match prop {
                WebDavProperty::CreationDate => {
                    DavValue::Iso8601Date(Iso8601DateTime::new(meta.created))
                }
                WebDavProperty::DisplayName => DavValue::String(meta.name.clone()),
                WebDavProperty::GetContentLanguage => return not_found(),
                WebDavProperty::GetContentLength => {
                    if item.is_collection() {
                        return not_found();
                    }
                    DavValue::Uint64(meta.size)
                }
                WebDavProperty::GetContentType => DavValue::String(meta.mime_type.clone()),
                WebDavProperty::GetETag => DavValue::String(meta.etag.clone()),
                WebDavProperty::GetLastModified => {
                    DavValue::Rfc1123Date(Rfc1123DateTime::new(meta.modified / 1000))
                }
                WebDavProperty::ResourceType => {
                    if item.is_collection() {
                        DavValue::ResourceTypes(List(vec![ResourceType::Collection]))
                    } else {
                        DavValue::ResourceTypes(List(Vec::new()))
                    }
                }
                WebDavProperty::LockDiscovery => DavValue::ActiveLocks(List(
                    locks
                        .active_locks(&meta.full_path)
                        .iter()
                        .map(|lock| lock.to_active_lock())
                        .collect(),
                )),
                WebDavProperty::SupportedLock => {
                    DavValue::LockEntries(locks.supported_locks().0)
                }
                WebDavProperty::IsCollection => DavValue::Bool(item.is_collection()),
                WebDavProperty::IsReadOnly => DavValue::Bool(read_only),
            },
            DavProperty::Microsoft(prop) => match prop {
                MsProperty::Win32CreationTime => {
                    DavValue::Rfc1123Date(Rfc1123DateTime::new(meta.created / 1000))
                }
                MsProperty::Win32LastAccessTime | MsProperty::Win32LastModifiedTime => {
                    DavValue::Rfc1123Date(Rfc1123DateTime::new(meta.modified / 1000))
                }
                MsProperty::Win32FileAttributes => DavValue::String(
                    if item.is_collection() {
                        ATTRIBUTES_DIRECTORY
                    } else {
                        ATTRIBUTES_FILE
                    }
                    .to_string(),
                ),
            },
            DavProperty::DeadProperty(_) => return not_found(),
        };

        (value, StatusCode::OK)
    }

    /// Stores a client supplied value. Read-only properties and
    /// properties unknown to the server answer 403.
    pub fn set(&self, item: &StoreItem, property: &DavProperty, value: &DavValue) -> StatusCode {
        if !Self::writable(property) {
            return StatusCode::FORBIDDEN;
        }
        let text = match value {
            DavValue::String(text) => text.clone(),
            DavValue::Null => String::new(),
            other => other.to_string(),
        };
        self.overlay
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .insert((item.full_path().to_string(), property.clone()), text);
        StatusCode::OK
    }

    pub fn remove(&self, item: &StoreItem, property: &DavProperty) -> StatusCode {
        if !Self::writable(property) {
            return StatusCode::FORBIDDEN;
        }
        self.overlay
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .remove(&(item.full_path().to_string(), property.clone()));
        StatusCode::OK
    }

    /// Drops overlay values under a deleted or moved subtree.
    pub fn forget(&self, path: &str) {
        let prefix = format!("{path}/");
        self.overlay
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .retain(|(key, _), _| key != path && !key.starts_with(&prefix));
    }

    fn overlay_get(&self, item: &StoreItem, property: &DavProperty) -> Option<String> {
        if !Self::writable(property) {
            return None;
        }
        self.overlay
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .get(&(item.full_path().to_string(), property.clone()))
            .cloned()
    }

    fn writable(property: &DavProperty) -> bool {
        matches!(property, DavProperty::Microsoft(_))
    }
}

fn live(property: WebDavProperty) -> PropertyDescriptor {
    PropertyDescriptor {
        property: DavProperty::WebDav(property),
        is_expensive: false,
        is_computed: matches!(
            property,
            WebDavProperty::LockDiscovery
                | WebDavProperty::SupportedLock
                | WebDavProperty::ResourceType
                | WebDavProperty::IsCollection
                | WebDavProperty::IsReadOnly
        ),
        writable: false,
    }
}

fn win32(property: MsProperty) -> PropertyDescriptor {
    PropertyDescriptor {
        property: DavProperty::Microsoft(property),
        is_expensive: true,
        is_computed: false,
        writable: true,
    }
}

fn not_found() -> (DavValue, StatusCode) {
    (DavValue::Null, StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbox::ObjectInfo;

    fn file_item() -> StoreItem {
        StoreItem::from_object(ObjectInfo {
            path: "docs/report.txt".to_string(),
            is_dir: false,
            size: 10,
            created: 1_100_251_949_000,
            modified: 1_100_251_949_000,
            etag: "\"abc\"".to_string(),
            mime_type: Some("text/plain".to_string()),
        })
    }

    fn collection_item() -> StoreItem {
        StoreItem::from_object(ObjectInfo {
            path: "docs".to_string(),
            is_dir: true,
            size: 0,
            created: 0,
            modified: 0,
            etag: "\"dir\"".to_string(),
            mime_type: None,
        })
    }

    #[test]
    fn content_length_is_unknown_on_collections() {
        let manager = PropertyManager::new();
        let locks = LockManager::new(600);
        let (_, status) = manager.get(
            &collection_item(),
            &locks,
            false,
            &DavProperty::WebDav(WebDavProperty::GetContentLength),
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (value, status) = manager.get(
            &file_item(),
            &locks,
            false,
            &DavProperty::WebDav(WebDavProperty::GetContentLength),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, DavValue::Uint64(10));
    }

    #[test]
    fn win32_attributes_round_trip() {
        let manager = PropertyManager::new();
        let locks = LockManager::new(600);
        let item = file_item();
        let property = DavProperty::Microsoft(MsProperty::Win32FileAttributes);

        let (value, _) = manager.get(&item, &locks, false, &property);
        assert_eq!(value, DavValue::String(ATTRIBUTES_FILE.to_string()));

        let status = manager.set(
            &item,
            &property,
            &DavValue::String("00000021".to_string()),
        );
        assert_eq!(status, StatusCode::OK);
        let (value, _) = manager.get(&item, &locks, false, &property);
        assert_eq!(value, DavValue::String("00000021".to_string()));

        assert_eq!(manager.remove(&item, &property), StatusCode::OK);
        let (value, _) = manager.get(&item, &locks, false, &property);
        assert_eq!(value, DavValue::String(ATTRIBUTES_FILE.to_string()));
    }

    #[test]
    fn live_properties_reject_writes() {
        let manager = PropertyManager::new();
        let item = file_item();
        assert_eq!(
            manager.set(
                &item,
                &DavProperty::WebDav(WebDavProperty::GetETag),
                &DavValue::String("\"forged\"".to_string()),
            ),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn allprop_excludes_expensive_properties() {
        let manager = PropertyManager::new();
        let props = manager.all_props(false);
        assert!(props
            .iter()
            .all(|prop| !matches!(prop, DavProperty::Microsoft(_))));
        assert!(manager
            .prop_names(false)
            .iter()
            .any(|prop| matches!(prop, DavProperty::Microsoft(_))));
    }
}
