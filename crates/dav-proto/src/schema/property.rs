/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{Depth, Timeout};

use super::{
    request::{DavPropertyValue, DeadElementTag, DeadProperty},
    response::{Href, List},
    Element, NamedElement, Namespace,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DavProperty {
    WebDav(WebDavProperty),
    Microsoft(MsProperty),
    DeadProperty(DeadElementTag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebDavProperty {
    CreationDate,
    DisplayName,
    GetContentLanguage,
    GetContentLength,
    GetContentType,
    GetETag,
    GetLastModified,
    ResourceType,
    LockDiscovery,
    SupportedLock,
    IsCollection,
    IsReadOnly,
}

/// Proprietary attributes queried and written by the Windows redirector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsProperty {
    Win32CreationTime,
    Win32LastAccessTime,
    Win32LastModifiedTime,
    Win32FileAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DavValue {
    Rfc1123Date(Rfc1123DateTime),
    Iso8601Date(Iso8601DateTime),
    Uint64(u64),
    Bool(bool),
    String(String),
    CData(String),
    ResourceTypes(List<ResourceType>),
    ActiveLocks(List<ActiveLock>),
    LockEntries(List<LockEntry>),
    DeadProperty(DeadProperty),
    Null,
}

/// Unix timestamp in seconds, rendered in the RFC 1123 `GMT` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Rfc1123DateTime(pub(crate) i64);

/// Unix timestamp in milliseconds, rendered as ISO 8601. Precision below
/// one millisecond is dropped (the Windows client mis-parses it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Iso8601DateTime(pub(crate) i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Collection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct LockDiscovery(pub List<ActiveLock>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLock {
    pub lock_scope: LockScope,
    pub lock_type: LockType,
    pub depth: Depth,
    pub owner: Option<DeadProperty>,
    pub timeout: Option<Timeout>,
    pub lock_token: Option<Href>,
    pub lock_root: Href,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct SupportedLock(pub List<LockEntry>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEntry {
    pub lock_scope: LockScope,
    pub lock_type: LockType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    Exclusive,
    Shared,
}

impl DavProperty {
    /// Properties returned by `allprop`. Expensive properties (the Win32
    /// attribute set) are excluded and must be requested by name.
    pub const ALL_PROPS: [DavProperty; 11] = [
        DavProperty::WebDav(WebDavProperty::CreationDate),
        DavProperty::WebDav(WebDavProperty::DisplayName),
        DavProperty::WebDav(WebDavProperty::GetContentLength),
        DavProperty::WebDav(WebDavProperty::GetContentType),
        DavProperty::WebDav(WebDavProperty::GetETag),
        DavProperty::WebDav(WebDavProperty::GetLastModified),
        DavProperty::WebDav(WebDavProperty::ResourceType),
        DavProperty::WebDav(WebDavProperty::LockDiscovery),
        DavProperty::WebDav(WebDavProperty::SupportedLock),
        DavProperty::WebDav(WebDavProperty::IsCollection),
        DavProperty::WebDav(WebDavProperty::IsReadOnly),
    ];

    pub fn from_element(name: NamedElement) -> Option<DavProperty> {
        match (name.ns, name.element) {
            (Namespace::Dav, Element::Creationdate) => {
                Some(DavProperty::WebDav(WebDavProperty::CreationDate))
            }
            (Namespace::Dav, Element::Displayname) => {
                Some(DavProperty::WebDav(WebDavProperty::DisplayName))
            }
            (Namespace::Dav, Element::Getcontentlanguage) => {
                Some(DavProperty::WebDav(WebDavProperty::GetContentLanguage))
            }
            (Namespace::Dav, Element::Getcontentlength) => {
                Some(DavProperty::WebDav(WebDavProperty::GetContentLength))
            }
            (Namespace::Dav, Element::Getcontenttype) => {
                Some(DavProperty::WebDav(WebDavProperty::GetContentType))
            }
            (Namespace::Dav, Element::Getetag) => {
                Some(DavProperty::WebDav(WebDavProperty::GetETag))
            }
            (Namespace::Dav, Element::Getlastmodified) => {
                Some(DavProperty::WebDav(WebDavProperty::GetLastModified))
            }
            (Namespace::Dav, Element::Resourcetype) => {
                Some(DavProperty::WebDav(WebDavProperty::ResourceType))
            }
            (Namespace::Dav, Element::Lockdiscovery) => {
                Some(DavProperty::WebDav(WebDavProperty::LockDiscovery))
            }
            (Namespace::Dav, Element::Supportedlock) => {
                Some(DavProperty::WebDav(WebDavProperty::SupportedLock))
            }
            (Namespace::Dav, Element::Iscollection) => {
                Some(DavProperty::WebDav(WebDavProperty::IsCollection))
            }
            (Namespace::Dav, Element::Isreadonly) => {
                Some(DavProperty::WebDav(WebDavProperty::IsReadOnly))
            }
            (Namespace::Microsoft, Element::Win32CreationTime) => {
                Some(DavProperty::Microsoft(MsProperty::Win32CreationTime))
            }
            (Namespace::Microsoft, Element::Win32LastAccessTime) => {
                Some(DavProperty::Microsoft(MsProperty::Win32LastAccessTime))
            }
            (Namespace::Microsoft, Element::Win32LastModifiedTime) => {
                Some(DavProperty::Microsoft(MsProperty::Win32LastModifiedTime))
            }
            (Namespace::Microsoft, Element::Win32FileAttributes) => {
                Some(DavProperty::Microsoft(MsProperty::Win32FileAttributes))
            }
            _ => None,
        }
    }
}

impl Rfc1123DateTime {
    pub fn new(timestamp: i64) -> Self {
        Self(timestamp)
    }
}

impl Iso8601DateTime {
    pub fn new(timestamp_millis: i64) -> Self {
        Self(timestamp_millis)
    }
}

impl From<DavProperty> for DavPropertyValue {
    fn from(value: DavProperty) -> Self {
        DavPropertyValue {
            property: value,
            value: DavValue::Null,
        }
    }
}

impl From<WebDavProperty> for DavProperty {
    fn from(prop: WebDavProperty) -> Self {
        DavProperty::WebDav(prop)
    }
}

impl From<MsProperty> for DavProperty {
    fn from(prop: MsProperty) -> Self {
        DavProperty::Microsoft(prop)
    }
}

impl From<String> for DavValue {
    fn from(v: String) -> Self {
        DavValue::String(v)
    }
}

impl From<&str> for DavValue {
    fn from(v: &str) -> Self {
        DavValue::String(v.to_string())
    }
}

impl From<u64> for DavValue {
    fn from(v: u64) -> Self {
        DavValue::Uint64(v)
    }
}

impl From<bool> for DavValue {
    fn from(v: bool) -> Self {
        DavValue::Bool(v)
    }
}

impl From<Rfc1123DateTime> for DavValue {
    fn from(v: Rfc1123DateTime) -> Self {
        DavValue::Rfc1123Date(v)
    }
}

impl From<Iso8601DateTime> for DavValue {
    fn from(v: Iso8601DateTime) -> Self {
        DavValue::Iso8601Date(v)
    }
}

impl From<Vec<ResourceType>> for DavValue {
    fn from(v: Vec<ResourceType>) -> Self {
        DavValue::ResourceTypes(List(v))
    }
}

impl From<Vec<ActiveLock>> for DavValue {
    fn from(v: Vec<ActiveLock>) -> Self {
        DavValue::ActiveLocks(List(v))
    }
}

impl From<LockDiscovery> for DavValue {
    fn from(v: LockDiscovery) -> Self {
        DavValue::ActiveLocks(v.0)
    }
}

impl From<SupportedLock> for DavValue {
    fn from(v: SupportedLock) -> Self {
        DavValue::LockEntries(v.0)
    }
}

impl From<DeadProperty> for DavValue {
    fn from(v: DeadProperty) -> Self {
        DavValue::DeadProperty(v)
    }
}

impl ActiveLock {
    pub fn new(lock_root: impl Into<String>, lock_scope: LockScope) -> Self {
        Self {
            lock_scope,
            lock_type: LockType::Write,
            depth: Depth::Infinity,
            owner: None,
            timeout: None,
            lock_token: None,
            lock_root: Href(lock_root.into()),
        }
    }

    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(Timeout::Second(seconds));
        self
    }

    pub fn with_owner_opt(mut self, owner: Option<DeadProperty>) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_lock_token(mut self, token: impl Into<String>) -> Self {
        self.lock_token = Some(Href(token.into()));
        self
    }
}

impl Default for SupportedLock {
    fn default() -> Self {
        Self(List(vec![
            LockEntry {
                lock_scope: LockScope::Exclusive,
                lock_type: LockType::Write,
            },
            LockEntry {
                lock_scope: LockScope::Shared,
                lock_type: LockType::Write,
            },
        ]))
    }
}
