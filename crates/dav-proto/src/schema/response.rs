/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::Display;

use hyper::StatusCode;

use super::{request::DavPropertyValue, Namespaces};

pub struct MultiStatus {
    pub namespaces: Namespaces,
    pub response: List<Response>,
    pub response_description: Option<ResponseDescription>,
}

pub struct Response {
    pub href: Href,
    pub typ: ResponseType,
    pub error: Option<Condition>,
    pub response_description: Option<ResponseDescription>,
    pub location: Option<Location>,
}

pub enum ResponseType {
    PropStat(List<PropStat>),
    Status { status: Status },
}

#[repr(transparent)]
pub struct Status(pub StatusCode);

#[repr(transparent)]
pub struct Location(pub Href);

#[repr(transparent)]
pub struct ResponseDescription(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Href(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct List<T: Display>(pub Vec<T>);

pub struct PropStat {
    pub prop: Prop,
    pub status: Status,
    pub error: Option<Condition>,
    pub response_description: Option<ResponseDescription>,
}

#[repr(transparent)]
pub struct Prop(pub List<DavPropertyValue>);

/// The `<D:prop>` document returned by LOCK.
pub struct PropResponse {
    pub namespaces: Namespaces,
    pub properties: List<DavPropertyValue>,
}

pub struct ErrorResponse {
    pub namespaces: Namespaces,
    pub error: Condition,
}

pub enum Condition {
    Base(BaseCondition),
}

pub enum BaseCondition {
    NoConflictingLock(List<Href>),
    LockTokenSubmitted(List<Href>),
    LockTokenMatchesRequestUri,
    CannotModifyProtectedProperty,
    PropFindFiniteDepth,
    ResourceMustBeNull,
}

impl Condition {
    pub fn display_name(&self) -> &'static str {
        match self {
            Condition::Base(condition) => match condition {
                BaseCondition::NoConflictingLock(_) => "no-conflicting-lock",
                BaseCondition::LockTokenSubmitted(_) => "lock-token-submitted",
                BaseCondition::LockTokenMatchesRequestUri => "lock-token-matches-request-uri",
                BaseCondition::CannotModifyProtectedProperty => {
                    "cannot-modify-protected-property"
                }
                BaseCondition::PropFindFiniteDepth => "propfind-finite-depth",
                BaseCondition::ResourceMustBeNull => "resource-must-be-null",
            },
        }
    }
}

impl From<String> for Href {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Href {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl MultiStatus {
    pub fn is_empty(&self) -> bool {
        self.response.0.is_empty()
    }
}
