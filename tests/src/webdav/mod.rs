/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod basic;
pub mod copy_move;
pub mod lock;
pub mod prop;
pub mod put_get;

use std::sync::Arc;

use dav::{request::DavRequestHandler, DavConfig, DavServer};
use hyper::{Body, Method, StatusCode};
use quick_xml::events::Event;
use tbox::memory::MemoryBackend;

/// In-process gateway over the memory backend; requests go straight
/// into the dispatcher without a socket.
pub struct WebDavTest {
    pub server: Arc<DavServer>,
    pub backend: Arc<MemoryBackend>,
}

impl WebDavTest {
    pub fn new() -> Self {
        Self::with_config(DavConfig::default())
    }

    pub fn with_config(config: DavConfig) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        WebDavTest {
            server: Arc::new(DavServer::new(backend.clone(), config)),
            backend,
        }
    }

    pub async fn request(&self, method: &str, path: &str, body: &str) -> DavResponse {
        self.request_with_headers::<[(&str, &str); 0]>(method, path, [], body)
            .await
    }

    pub async fn request_with_headers<I>(
        &self,
        method: &str,
        path: &str,
        headers: I,
        body: &str,
    ) -> DavResponse
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        self.request_with_owned_headers(
            method,
            path,
            headers
                .into_iter()
                .map(|(name, value)| (name, value.to_string()))
                .collect(),
            body.as_bytes().to_vec(),
        )
        .await
    }

    pub async fn request_with_owned_headers(
        &self,
        method: &str,
        path: &str,
        headers: Vec<(&'static str, String)>,
        body: Vec<u8>,
    ) -> DavResponse {
        let mut builder = hyper::Request::builder()
            .method(Method::from_bytes(method.as_bytes()).unwrap())
            .uri(path)
            .header("host", "localhost:8080");
        let mut has_length = false;
        for (name, value) in &headers {
            has_length |= name.eq_ignore_ascii_case("content-length");
            builder = builder.header(*name, value.as_str());
        }
        if !has_length && !body.is_empty() {
            builder = builder.header("content-length", body.len().to_string());
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = self.server.handle_request(request).await.build();
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = String::from_utf8_lossy(&body).into_owned();
        let flat = flatten_xml(&body);

        DavResponse {
            status,
            headers,
            body,
            flat,
        }
    }

    pub async fn put(&self, path: &str, contents: &str) -> DavResponse {
        self.request("PUT", path, contents).await
    }

    pub async fn mkcol(&self, path: &str) -> DavResponse {
        self.request("MKCOL", path, "").await
    }

    pub async fn propfind(&self, path: &str, depth: &'static str, body: &str) -> DavResponse {
        self.request_with_headers("PROPFIND", path, [("depth", depth)], body)
            .await
    }
}

pub struct DavResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: String,
    flat: Vec<(String, String)>,
}

impl DavResponse {
    pub fn with_status(self, expected: StatusCode) -> Self {
        assert_eq!(self.status, expected, "body: {}", self.body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn with_header(self, name: &str, expected: &str) -> Self {
        assert_eq!(self.header(name), Some(expected), "headers: {:?}", self.headers);
        self
    }

    pub fn values(&self, path: &str) -> Vec<&str> {
        self.flat
            .iter()
            .filter(|(key, _)| key == path)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn value(&self, path: &str) -> &str {
        let values = self.values(path);
        assert_eq!(
            values.len(),
            1,
            "expected one value at {path}, body: {}",
            self.body
        );
        values[0]
    }

    pub fn with_value(self, path: &str, expected: &str) -> Self {
        assert_eq!(self.value(path), expected, "body: {}", self.body);
        self
    }

    /// Hrefs of all `<D:response>` entries, in document order.
    pub fn hrefs(&self) -> Vec<&str> {
        self.values("D:multistatus.D:response.D:href")
    }

    /// The propstat status a property landed in. Properties and their
    /// status appear within the same `<D:propstat>` group.
    pub fn property_status(&self, property_suffix: &str) -> Option<&str> {
        let mut pending = false;
        for (key, value) in &self.flat {
            if key.contains(".D:propstat.D:prop.") {
                if key.ends_with(property_suffix) {
                    pending = true;
                }
            } else if key.ends_with(".D:propstat.D:status") {
                if pending {
                    return Some(value.as_str());
                }
            }
        }
        None
    }

    pub fn lock_token(&self) -> String {
        self.value("D:prop.D:lockdiscovery.D:activelock.D:locktoken.D:href")
            .to_string()
    }
}

/// Flattens an XML document into dotted-path / text pairs, keeping the
/// wire prefixes.
fn flatten_xml(xml: &str) -> Vec<(String, String)> {
    if !xml.starts_with("<?xml") {
        return Vec::new();
    }
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut flat: Vec<(String, String)> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                stack.push(String::from_utf8_lossy(tag.name().as_ref()).into_owned());
            }
            Ok(Event::Empty(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                let mut path = stack.join(".");
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(&name);
                flat.push((path, String::new()));
            }
            Ok(Event::Text(text)) => {
                let value = text.unescape().unwrap_or_default().into_owned();
                if !value.trim().is_empty() {
                    flat.push((stack.join("."), value));
                }
            }
            Ok(Event::End(_)) => {
                let path = stack.join(".");
                let prefix = format!("{path}.");
                if !flat
                    .iter()
                    .any(|(key, _)| *key == path || key.starts_with(&prefix))
                {
                    flat.push((path, String::new()));
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => panic!("bad XML in response: {err}\n{xml}"),
        }
    }

    flat
}
