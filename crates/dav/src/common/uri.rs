/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::RequestHeaders;
use hyper::StatusCode;
use store::DavPath;

use crate::{DavError, DavServer};

pub(crate) trait DavUriResource: Sync + Send {
    fn validate_uri(&self, uri: &str) -> crate::Result<DavPath>;

    fn validate_destination(&self, headers: &RequestHeaders<'_>) -> crate::Result<DavPath>;
}

impl DavUriResource for DavServer {
    fn validate_uri(&self, uri: &str) -> crate::Result<DavPath> {
        DavPath::parse(strip_authority(uri))
            .map_err(|_| DavError::Code(StatusCode::BAD_REQUEST))
    }

    /// `Destination` must be an absolute URL on the request authority,
    /// or an absolute path.
    fn validate_destination(&self, headers: &RequestHeaders<'_>) -> crate::Result<DavPath> {
        let destination = headers
            .destination
            .ok_or(DavError::Code(StatusCode::BAD_REQUEST))?;

        if let Some(rest) = destination
            .strip_prefix("http://")
            .or_else(|| destination.strip_prefix("https://"))
        {
            let (authority, path) = rest
                .split_once('/')
                .ok_or(DavError::Code(StatusCode::BAD_REQUEST))?;
            if headers
                .host
                .is_some_and(|host| !host.eq_ignore_ascii_case(authority))
            {
                return Err(DavError::Code(StatusCode::BAD_REQUEST));
            }
            DavPath::parse(path).map_err(|_| DavError::Code(StatusCode::BAD_REQUEST))
        } else if destination.starts_with('/') {
            DavPath::parse(destination).map_err(|_| DavError::Code(StatusCode::BAD_REQUEST))
        } else {
            Err(DavError::Code(StatusCode::BAD_REQUEST))
        }
    }
}

fn strip_authority(uri: &str) -> &str {
    uri.strip_prefix("http://")
        .or_else(|| uri.strip_prefix("https://"))
        .and_then(|rest| rest.find('/').map(|idx| &rest[idx..]))
        .unwrap_or(uri)
}
