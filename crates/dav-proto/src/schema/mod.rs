/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod property;
pub mod request;
pub mod response;

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Dav,
    Microsoft,
}

impl Namespace {
    pub fn try_parse(value: &[u8]) -> Option<Self> {
        hashify::tiny_map!(value,
            "DAV:" => Namespace::Dav,
            "urn:schemas-microsoft-com:" => Namespace::Microsoft,
        )
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Namespace::Dav => "DAV:",
            Namespace::Microsoft => "urn:schemas-microsoft-com:",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Dav => "D",
            Namespace::Microsoft => "Z",
        }
    }
}

/// Namespace declarations emitted on every response root. The Windows 7
/// client requires both prefixes to be declared up front.
#[derive(Debug, Default, Clone, Copy)]
pub struct Namespaces;

impl Display for Namespaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "xmlns:D=\"DAV:\" xmlns:Z=\"urn:schemas-microsoft-com:\""
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Multistatus,
    Response,
    Propstat,
    Propfind,
    Propname,
    Allprop,
    Include,
    Prop,
    Propertyupdate,
    Set,
    Remove,
    Lockinfo,
    Lockscope,
    Locktype,
    Lockdiscovery,
    Supportedlock,
    Owner,
    Exclusive,
    Shared,
    Write,
    Href,
    Collection,
    Resourcetype,
    Creationdate,
    Displayname,
    Getcontentlanguage,
    Getcontentlength,
    Getcontenttype,
    Getetag,
    Getlastmodified,
    Iscollection,
    Isreadonly,
    Win32CreationTime,
    Win32LastAccessTime,
    Win32LastModifiedTime,
    Win32FileAttributes,
}

impl Element {
    pub fn try_parse(value: &[u8]) -> Option<Self> {
        hashify::tiny_map!(value,
            "multistatus" => Element::Multistatus,
            "response" => Element::Response,
            "propstat" => Element::Propstat,
            "propfind" => Element::Propfind,
            "propname" => Element::Propname,
            "allprop" => Element::Allprop,
            "include" => Element::Include,
            "prop" => Element::Prop,
            "propertyupdate" => Element::Propertyupdate,
            "set" => Element::Set,
            "remove" => Element::Remove,
            "lockinfo" => Element::Lockinfo,
            "lockscope" => Element::Lockscope,
            "locktype" => Element::Locktype,
            "lockdiscovery" => Element::Lockdiscovery,
            "supportedlock" => Element::Supportedlock,
            "owner" => Element::Owner,
            "exclusive" => Element::Exclusive,
            "shared" => Element::Shared,
            "write" => Element::Write,
            "href" => Element::Href,
            "collection" => Element::Collection,
            "resourcetype" => Element::Resourcetype,
            "creationdate" => Element::Creationdate,
            "displayname" => Element::Displayname,
            "getcontentlanguage" => Element::Getcontentlanguage,
            "getcontentlength" => Element::Getcontentlength,
            "getcontenttype" => Element::Getcontenttype,
            "getetag" => Element::Getetag,
            "getlastmodified" => Element::Getlastmodified,
            "iscollection" => Element::Iscollection,
            "isreadonly" => Element::Isreadonly,
            "Win32CreationTime" => Element::Win32CreationTime,
            "Win32LastAccessTime" => Element::Win32LastAccessTime,
            "Win32LastModifiedTime" => Element::Win32LastModifiedTime,
            "Win32FileAttributes" => Element::Win32FileAttributes,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedElement {
    pub ns: Namespace,
    pub element: Element,
}

impl NamedElement {
    pub fn dav(element: Element) -> Self {
        NamedElement {
            ns: Namespace::Dav,
            element,
        }
    }

    pub fn microsoft(element: Element) -> Self {
        NamedElement {
            ns: Namespace::Microsoft,
            element,
        }
    }
}
