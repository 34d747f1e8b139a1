/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::Display;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use unicode_normalization::{is_nfc, UnicodeNormalization};

use crate::StoreError;

/// Characters escaped when emitting a path segment into an href. The
/// complement of `pchar` (RFC 3986), minus the percent sign itself.
pub const SEGMENT: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// A request path in canonical storage form: percent-decoded, NFC
/// normalized, slash separated with no leading or trailing slash. The
/// empty key addresses the root collection. A trailing slash on the
/// wire is remembered so responses can preserve collection hrefs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DavPath {
    key: String,
    had_trailing_slash: bool,
}

impl DavPath {
    /// Parses the path portion of a request URI. Dot segments, NUL
    /// bytes and undecodable escapes are rejected.
    pub fn parse(uri_path: &str) -> crate::Result<Self> {
        let trimmed = uri_path.trim_start_matches('/');
        let had_trailing_slash = trimmed.ends_with('/') || trimmed.is_empty();
        let mut segments = Vec::with_capacity(8);
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                continue;
            }
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map_err(|_| StoreError::BadName)?;
            if !validate_name(&decoded) {
                return Err(StoreError::BadName);
            }
            if is_nfc(&decoded) {
                segments.push(decoded.into_owned());
            } else {
                segments.push(decoded.nfc().collect());
            }
        }

        Ok(DavPath {
            key: segments.join("/"),
            had_trailing_slash,
        })
    }

    pub fn root() -> Self {
        DavPath {
            key: String::new(),
            had_trailing_slash: true,
        }
    }

    /// The storage key; empty for the root collection.
    pub fn as_key(&self) -> &str {
        &self.key
    }

    pub fn is_root(&self) -> bool {
        self.key.is_empty()
    }

    pub fn had_trailing_slash(&self) -> bool {
        self.had_trailing_slash
    }

    /// Last path segment, empty for the root.
    pub fn name(&self) -> &str {
        self.key.rsplit_once('/').map_or(self.key.as_str(), |(_, name)| name)
    }

    pub fn parent(&self) -> DavPath {
        DavPath {
            key: self
                .key
                .rsplit_once('/')
                .map_or(String::new(), |(parent, _)| parent.to_string()),
            had_trailing_slash: true,
        }
    }

    pub fn child(&self, name: &str) -> crate::Result<DavPath> {
        if !validate_name(name) {
            return Err(StoreError::BadName);
        }
        Ok(DavPath {
            key: if self.key.is_empty() {
                name.to_string()
            } else {
                format!("{}/{name}", self.key)
            },
            had_trailing_slash: false,
        })
    }

    pub fn from_key(key: impl Into<String>) -> DavPath {
        DavPath {
            key: key.into(),
            had_trailing_slash: false,
        }
    }

    pub fn is_ancestor_of(&self, other: &DavPath) -> bool {
        self.key.is_empty() && !other.key.is_empty()
            || other
                .key
                .strip_prefix(&self.key)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Emits the path as an href, percent-encoding each segment and
    /// appending a trailing slash for collections.
    pub fn href(&self, is_collection: bool) -> String {
        encode_href(&self.key, is_collection)
    }
}

pub fn encode_href(key: &str, is_collection: bool) -> String {
    if key.is_empty() {
        return "/".to_string();
    }
    let mut href = String::with_capacity(key.len() + 8);
    for segment in key.split('/') {
        href.push('/');
        href.extend(utf8_percent_encode(segment, &SEGMENT));
    }
    if is_collection {
        href.push('/');
    }
    href
}

/// Names must be single, non-empty segments without path syntax.
pub fn validate_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\0'])
}

impl Display for DavPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.key)
    }
}
