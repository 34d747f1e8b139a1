/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::str::FromStr;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use hyper::{header, HeaderMap};
use serde::Deserialize;
use tbox::Credentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum AuthMode {
    #[default]
    None,
    JaCookie,
    UserToken,
    Custom,
    Mixed,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "None" => Ok(AuthMode::None),
            "JaCookie" => Ok(AuthMode::JaCookie),
            "UserToken" => Ok(AuthMode::UserToken),
            "Custom" => Ok(AuthMode::Custom),
            "Mixed" => Ok(AuthMode::Mixed),
            other => Err(format!("invalid auth mode {other}")),
        }
    }
}

/// The access token forwarded to the backend service.
pub struct StaticCredentials(String);

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Arc<Self> {
        Arc::new(StaticCredentials(token.into()))
    }
}

impl Credentials for StaticCredentials {
    fn access_token(&self) -> String {
        self.0.clone()
    }
}

/// Validates incoming requests against the configured auth mode.
pub struct AuthGate {
    mode: AuthMode,
    username: Option<String>,
    password: Option<String>,
    cookie: Option<String>,
    token: Option<Arc<dyn Credentials>>,
}

impl AuthGate {
    pub fn new(
        mode: AuthMode,
        username: Option<String>,
        password: Option<String>,
        cookie: Option<String>,
        token: Option<Arc<dyn Credentials>>,
    ) -> Self {
        AuthGate {
            mode,
            username,
            password,
            cookie,
            token,
        }
    }

    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        match self.mode {
            AuthMode::None => true,
            AuthMode::JaCookie => self.check_cookie(headers),
            AuthMode::UserToken => self.check_token(headers),
            AuthMode::Custom => self.check_basic(headers),
            AuthMode::Mixed => {
                self.check_cookie(headers)
                    || self.check_token(headers)
                    || self.check_basic(headers)
            }
        }
    }

    fn check_cookie(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.cookie.as_deref() else {
            return false;
        };
        headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|cookies| {
                cookies
                    .split(';')
                    .any(|cookie| cookie.trim() == expected)
            })
    }

    fn check_token(&self, headers: &HeaderMap) -> bool {
        let Some(provider) = &self.token else {
            return false;
        };
        let expected = provider.access_token();
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value
                    .strip_prefix("Bearer ")
                    .map_or(value == expected, |bearer| bearer == expected)
            })
    }

    fn check_basic(&self, headers: &HeaderMap) -> bool {
        let (Some(username), Some(password)) =
            (self.username.as_deref(), self.password.as_deref())
        else {
            return false;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Basic "))
            .and_then(|encoded| STANDARD.decode(encoded).ok())
            .and_then(|decoded| String::from_utf8(decoded).ok())
            .is_some_and(|credentials| {
                credentials
                    .split_once(':')
                    .is_some_and(|(user, pass)| user == username && pass == password)
            })
    }
}
