/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::{schema::property::Rfc1123DateTime, RequestHeaders};
use http_proto::HttpResponse;
use hyper::StatusCode;

use crate::{common::uri::DavUriResource, DavError, DavServer};

pub(crate) trait GetRequestHandler: Sync + Send {
    fn handle_get_request(
        &self,
        headers: &RequestHeaders<'_>,
        is_head: bool,
    ) -> impl std::future::Future<Output = crate::Result<HttpResponse>> + Send;
}

impl GetRequestHandler for DavServer {
    async fn handle_get_request(
        &self,
        headers: &RequestHeaders<'_>,
        is_head: bool,
    ) -> crate::Result<HttpResponse> {
        let path = self.validate_uri(headers.uri)?;
        let item = self.map_resource(&path).await?;

        // No directory listings are produced
        if item.is_collection() {
            return Err(DavError::Code(StatusCode::FORBIDDEN));
        }

        self.validate_headers(headers, &path, Some(&item), false)?;

        let meta = item.meta();
        let response = HttpResponse::new(StatusCode::OK)
            .with_content_type(meta.mime_type.clone())
            .with_etag(meta.etag.clone())
            .with_last_modified(Rfc1123DateTime::new(meta.modified / 1000).to_string());

        let range = match headers.range {
            Some(value) => match parse_range(value, meta.size) {
                RangeParse::Whole => None,
                RangeParse::Range(from, to) => Some((from, to)),
                RangeParse::Unsatisfiable => {
                    return Ok(HttpResponse::new(StatusCode::RANGE_NOT_SATISFIABLE)
                        .with_header("Content-Range", format!("bytes */{}", meta.size)));
                }
            },
            None => None,
        };

        match range {
            Some((from, to)) => {
                let response = response
                    .with_status(StatusCode::PARTIAL_CONTENT)
                    .with_header(
                        "Content-Range",
                        format!("bytes {from}-{to}/{}", meta.size),
                    );
                if is_head {
                    Ok(response.with_content_length(to - from + 1))
                } else {
                    let body = self.store.read(&path, Some((from, to))).await?;
                    Ok(response.with_binary_body(body))
                }
            }
            None => {
                if is_head {
                    Ok(response.with_content_length(meta.size))
                } else {
                    let body = self.store.read(&path, None).await?;
                    Ok(response.with_binary_body(body))
                }
            }
        }
    }
}

enum RangeParse {
    Whole,
    Range(u64, u64),
    Unsatisfiable,
}

/// A single `bytes=a-b`, `bytes=a-` or `bytes=-n` range. Multi-range
/// requests are answered with the full representation.
fn parse_range(value: &str, size: u64) -> RangeParse {
    let Some(spec) = value.trim().strip_prefix("bytes=") else {
        return RangeParse::Unsatisfiable;
    };
    if spec.contains(',') {
        return RangeParse::Whole;
    }
    let Some((from, to)) = spec.split_once('-') else {
        return RangeParse::Unsatisfiable;
    };
    let (from, to) = match (from.trim(), to.trim()) {
        ("", suffix) => {
            // Last n bytes
            let Ok(suffix) = suffix.parse::<u64>() else {
                return RangeParse::Unsatisfiable;
            };
            if suffix == 0 || size == 0 {
                return RangeParse::Unsatisfiable;
            }
            (size.saturating_sub(suffix), size - 1)
        }
        (from, "") => {
            let Ok(from) = from.parse::<u64>() else {
                return RangeParse::Unsatisfiable;
            };
            if from >= size {
                return RangeParse::Unsatisfiable;
            }
            (from, size - 1)
        }
        (from, to) => {
            let (Ok(from), Ok(to)) = (from.parse::<u64>(), to.parse::<u64>()) else {
                return RangeParse::Unsatisfiable;
            };
            if from > to || from >= size {
                return RangeParse::Unsatisfiable;
            }
            (from, to.min(size - 1))
        }
    };
    RangeParse::Range(from, to)
}
