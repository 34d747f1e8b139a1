/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::Display;

use time::OffsetDateTime;

use super::{XmlCdataEscape, XmlEscape};
use crate::schema::{
    property::{
        DavProperty, DavValue, Iso8601DateTime, MsProperty, ResourceType, Rfc1123DateTime,
        WebDavProperty,
    },
    response::PropResponse,
    Namespace,
};

const DOW: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl Display for PropResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><D:prop {}>{}</D:prop>",
            self.namespaces, self.properties
        )
    }
}

impl Display for crate::schema::request::DavPropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, attrs) = self.property.tag_name();

        write!(f, "<{}", name)?;

        if let Some(attrs) = attrs {
            write!(f, " {attrs}")?;
        }

        if !matches!(self.value, DavValue::Null) {
            write!(f, ">{}</{}>", self.value, name)
        } else {
            write!(f, "/>")
        }
    }
}

impl Display for Rfc1123DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dt = OffsetDateTime::from_unix_timestamp(self.0)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        write!(
            f,
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            DOW[dt.weekday().number_days_from_sunday() as usize],
            dt.day(),
            MONTH[dt.month() as usize - 1],
            dt.year(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
    }
}

impl Display for Iso8601DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let millis = self.0.rem_euclid(1000);
        let dt = OffsetDateTime::from_unix_timestamp(self.0.div_euclid(1000))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            dt.year(),
            dt.month() as u8,
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )?;
        if millis != 0 {
            write!(f, ".{millis:03}")?;
        }
        write!(f, "Z")
    }
}

impl Display for DavValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DavValue::Rfc1123Date(v) => v.fmt(f),
            DavValue::Iso8601Date(v) => v.fmt(f),
            DavValue::Uint64(v) => v.fmt(f),
            DavValue::Bool(v) => f.write_str(if *v { "1" } else { "0" }),
            DavValue::String(v) => v.write_escaped_to(f),
            DavValue::CData(v) => v.write_cdata_escaped_to(f),
            DavValue::ResourceTypes(v) => v.fmt(f),
            DavValue::ActiveLocks(v) => v.fmt(f),
            DavValue::LockEntries(v) => v.fmt(f),
            DavValue::DeadProperty(v) => v.fmt(f),
            DavValue::Null => Ok(()),
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Collection => write!(f, "<D:collection/>"),
        }
    }
}

impl DavProperty {
    pub fn tag_name(&self) -> (&str, Option<&str>) {
        (
            match self {
                DavProperty::WebDav(prop) => match prop {
                    WebDavProperty::CreationDate => "D:creationdate",
                    WebDavProperty::DisplayName => "D:displayname",
                    WebDavProperty::GetContentLanguage => "D:getcontentlanguage",
                    WebDavProperty::GetContentLength => "D:getcontentlength",
                    WebDavProperty::GetContentType => "D:getcontenttype",
                    WebDavProperty::GetETag => "D:getetag",
                    WebDavProperty::GetLastModified => "D:getlastmodified",
                    WebDavProperty::ResourceType => "D:resourcetype",
                    WebDavProperty::LockDiscovery => "D:lockdiscovery",
                    WebDavProperty::SupportedLock => "D:supportedlock",
                    WebDavProperty::IsCollection => "D:iscollection",
                    WebDavProperty::IsReadOnly => "D:isreadonly",
                },
                DavProperty::Microsoft(prop) => match prop {
                    MsProperty::Win32CreationTime => "Z:Win32CreationTime",
                    MsProperty::Win32LastAccessTime => "Z:Win32LastAccessTime",
                    MsProperty::Win32LastModifiedTime => "Z:Win32LastModifiedTime",
                    MsProperty::Win32FileAttributes => "Z:Win32FileAttributes",
                },
                DavProperty::DeadProperty(dead) => {
                    return (dead.name.as_str(), dead.attrs.as_deref())
                }
            },
            None,
        )
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            DavProperty::Microsoft(_) => Namespace::Microsoft,
            _ => Namespace::Dav,
        }
    }
}

impl PropResponse {
    pub fn new(properties: Vec<crate::schema::request::DavPropertyValue>) -> Self {
        PropResponse {
            namespaces: crate::schema::Namespaces,
            properties: crate::schema::response::List(properties),
        }
    }
}
