/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use hyper::{
    body::{Buf, HttpBody},
    header, Body, Response, StatusCode,
};

pub type HttpRequest = hyper::Request<Body>;

/// Response under construction; converted into a hyper response once
/// the handler is done with it.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    content_type: Option<String>,
    headers: Vec<(&'static str, String)>,
    body: HttpResponseBody,
}

#[derive(Debug)]
pub enum HttpResponseBody {
    Empty,
    Text(String),
    Binary(Vec<u8>),
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        HttpResponse {
            status,
            content_type: None,
            headers: Vec::new(),
            body: HttpResponseBody::Empty,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &HttpResponseBody {
        &self.body
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_xml_body(mut self, body: impl Into<String>) -> Self {
        self.body = HttpResponseBody::Text(body.into());
        self.content_type = Some("text/xml; charset=\"utf-8\"".to_string());
        self
    }

    pub fn with_binary_body(mut self, body: Vec<u8>) -> Self {
        self.body = HttpResponseBody::Binary(body);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_content_length(self, length: u64) -> Self {
        self.with_header("Content-Length", length.to_string())
    }

    pub fn with_etag(self, etag: impl Into<String>) -> Self {
        self.with_header("ETag", etag)
    }

    pub fn with_etag_opt(self, etag: Option<String>) -> Self {
        if let Some(etag) = etag {
            self.with_etag(etag)
        } else {
            self
        }
    }

    pub fn with_last_modified(self, last_modified: impl Into<String>) -> Self {
        self.with_header("Last-Modified", last_modified)
    }

    pub fn with_lock_token(self, token: &str) -> Self {
        self.with_header("Lock-Token", format!("<{token}>"))
    }

    pub fn with_no_cache(self) -> Self {
        self.with_header("Cache-Control", "no-store, no-cache, must-revalidate")
    }

    pub fn build(self) -> Response<Body> {
        let mut builder = Response::builder().status(self.status);
        if let Some(content_type) = self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let has_explicit_length = self
            .headers
            .iter()
            .any(|(name, _)| *name == "Content-Length");
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        if !has_explicit_length {
            builder = builder.header(
                header::CONTENT_LENGTH,
                match &self.body {
                    HttpResponseBody::Empty => 0,
                    HttpResponseBody::Text(text) => text.len(),
                    HttpResponseBody::Binary(bytes) => bytes.len(),
                },
            );
        }
        let response = match self.body {
            HttpResponseBody::Empty => builder.body(Body::empty()),
            HttpResponseBody::Text(text) => builder.body(Body::from(text)),
            HttpResponseBody::Binary(bytes) => builder.body(Body::from(bytes)),
        };
        // The builder only fails on malformed header values, which are
        // all constructed server side.
        response.unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap()
        })
    }
}

/// Collects a request body up to `max_size` bytes; `None` when the
/// limit is exceeded. A `max_size` of zero lifts the cap.
pub async fn fetch_body(request: &mut HttpRequest, max_size: usize) -> Option<Vec<u8>> {
    let body = request.body_mut();
    let mut data = Vec::new();
    loop {
        match body.data().await {
            Some(Ok(mut buf)) => {
                while buf.has_remaining() {
                    let chunk = buf.chunk();
                    if max_size > 0 && data.len() + chunk.len() > max_size {
                        return None;
                    }
                    data.extend_from_slice(chunk);
                    let advanced = chunk.len();
                    buf.advance(advanced);
                }
            }
            Some(Err(_)) => return Some(data),
            None => return Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_body_respects_cap() {
        let mut request = hyper::Request::builder()
            .body(Body::from(vec![0u8; 128]))
            .unwrap();
        assert_eq!(fetch_body(&mut request, 64).await, None);

        let mut request = hyper::Request::builder()
            .body(Body::from(vec![0u8; 128]))
            .unwrap();
        assert_eq!(fetch_body(&mut request, 0).await.map(|b| b.len()), Some(128));
    }

    #[test]
    fn build_sets_content_headers() {
        let response = HttpResponse::new(StatusCode::MULTI_STATUS)
            .with_xml_body("<a/>")
            .build();
        assert_eq!(response.status(), StatusCode::MULTI_STATUS);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/xml; charset=\"utf-8\""
        );
        assert_eq!(
            response.headers().get(header::CONTENT_LENGTH).unwrap(),
            "4"
        );
    }
}
