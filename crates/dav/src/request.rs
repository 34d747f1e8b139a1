/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Instant;

use dav_proto::{
    parser::{tokenizer::Tokenizer, DavParser},
    schema::{
        request::{LockInfo, PropFind, PropertyUpdate},
        response::ErrorResponse,
    },
    RequestHeaders,
};
use http_proto::{HttpRequest, HttpResponse};
use hyper::{body::HttpBody, Body, StatusCode};
use store::StoreError;

use crate::{
    common::lock::{LockRequest, LockRequestHandler},
    file::{
        copy_move::CopyMoveRequestHandler, delete::DeleteRequestHandler, get::GetRequestHandler,
        mkcol::MkColRequestHandler, propfind::PropFindRequestHandler,
        proppatch::PropPatchRequestHandler, update::UpdateRequestHandler,
    },
    DavError, DavMethod, DavServer,
};

const ALLOWED_METHODS: &str =
    "OPTIONS, GET, HEAD, PUT, DELETE, PROPFIND, PROPPATCH, MKCOL, COPY, MOVE, LOCK, UNLOCK";

pub trait DavRequestHandler: Sync + Send {
    fn handle_request(
        &self,
        request: HttpRequest,
    ) -> impl std::future::Future<Output = HttpResponse> + Send;
}

impl DavRequestHandler for DavServer {
    async fn handle_request(&self, request: HttpRequest) -> HttpResponse {
        let start_time = Instant::now();
        let Some(method) = DavMethod::parse(request.method()) else {
            return HttpResponse::new(StatusCode::NOT_IMPLEMENTED);
        };

        if method == DavMethod::OPTIONS {
            return HttpResponse::new(StatusCode::OK)
                .with_header("DAV", "1, 2")
                .with_header("MS-Author-Via", "DAV")
                .with_header("Allow", ALLOWED_METHODS);
        }
        if self.config.read_only && method.is_mutating() {
            return HttpResponse::new(StatusCode::FORBIDDEN);
        }

        let (parts, body) = request.into_parts();
        let mut headers = RequestHeaders::new(parts.uri.path());
        for (key, value) in &parts.headers {
            headers.parse(key.as_str(), value.to_str().unwrap_or_default());
        }
        if headers.invalid.is_some() {
            return HttpResponse::new(StatusCode::BAD_REQUEST);
        }

        let response = match self
            .dispatch_request(method, &headers, body)
            .await
        {
            Ok(response) => response,
            Err(err) => self.translate_error(&headers, err),
        };

        tracing::debug!(
            method = ?method,
            uri = %headers.uri,
            status = response.status().as_u16(),
            elapsed = ?start_time.elapsed(),
            "dav request"
        );

        response
    }
}

impl DavServer {
    async fn dispatch_request(
        &self,
        method: DavMethod,
        headers: &RequestHeaders<'_>,
        mut body: Body,
    ) -> crate::Result<HttpResponse> {
        // PUT streams its payload; every other body is an XML document
        // with a modest bound
        let body_data = if method == DavMethod::PUT {
            Vec::new()
        } else {
            let mut data = Vec::new();
            while let Some(chunk) = body.data().await {
                let chunk = chunk.map_err(|_| DavError::Store(StoreError::Cancelled))?;
                if data.len() + chunk.len() > self.config.max_xml_size {
                    return Err(DavError::Code(StatusCode::PAYLOAD_TOO_LARGE));
                }
                data.extend_from_slice(&chunk);
            }
            data
        };

        match method {
            DavMethod::PROPFIND => {
                let request = PropFind::parse(&mut Tokenizer::new(&body_data))?;
                self.handle_propfind_request(headers, request).await
            }
            DavMethod::PROPPATCH => {
                let request = PropertyUpdate::parse(&mut Tokenizer::new(&body_data))?;
                self.handle_proppatch_request(headers, request).await
            }
            DavMethod::GET => self.handle_get_request(headers, false).await,
            DavMethod::HEAD => self.handle_get_request(headers, true).await,
            DavMethod::PUT => self.handle_update_request(headers, body).await,
            DavMethod::DELETE => self.handle_delete_request(headers).await,
            DavMethod::MKCOL => {
                // MKCOL request bodies are not supported
                if !body_data.is_empty() {
                    return Err(DavError::Code(StatusCode::UNSUPPORTED_MEDIA_TYPE));
                }
                self.handle_mkcol_request(headers).await
            }
            DavMethod::COPY => self.handle_copy_move_request(headers, false).await,
            DavMethod::MOVE => self.handle_copy_move_request(headers, true).await,
            DavMethod::LOCK => {
                let request = if !body_data.is_empty() {
                    LockRequest::Lock(LockInfo::parse(&mut Tokenizer::new(&body_data))?)
                } else {
                    LockRequest::Refresh
                };
                self.handle_lock_request(headers, request).await
            }
            DavMethod::UNLOCK => {
                self.handle_lock_request(headers, LockRequest::Unlock).await
            }
            DavMethod::OPTIONS => unreachable!(),
        }
    }

    /// Every handler failure becomes a status code; stack traces never
    /// reach the wire.
    fn translate_error(&self, headers: &RequestHeaders<'_>, err: DavError) -> HttpResponse {
        match err {
            DavError::Parse(err) => {
                tracing::debug!(uri = %headers.uri, reason = %err, "malformed request body");
                if headers.content_type.is_some_and(|ct| ct.contains("/xml"))
                    || headers.content_type.is_none()
                {
                    HttpResponse::new(StatusCode::BAD_REQUEST)
                } else {
                    HttpResponse::new(StatusCode::UNSUPPORTED_MEDIA_TYPE)
                }
            }
            DavError::Condition(condition) => {
                tracing::debug!(
                    uri = %headers.uri,
                    condition = condition.condition.display_name(),
                    status = condition.code.as_u16(),
                    "precondition failed"
                );
                HttpResponse::new(condition.code)
                    .with_xml_body(ErrorResponse::new(condition.condition).to_string())
                    .with_no_cache()
            }
            DavError::Store(err) => {
                let status = match &err {
                    StoreError::NotFound => StatusCode::NOT_FOUND,
                    StoreError::Conflict => StatusCode::CONFLICT,
                    StoreError::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
                    StoreError::Forbidden => StatusCode::FORBIDDEN,
                    StoreError::BadName => StatusCode::BAD_REQUEST,
                    StoreError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
                    StoreError::Backend(err) if err.is_transient() => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::warn!(uri = %headers.uri, reason = %err, "store failure");
                }
                HttpResponse::new(status)
            }
            DavError::Code(code) => HttpResponse::new(code),
        }
    }
}
