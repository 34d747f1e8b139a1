/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod parser;
pub mod requests;
pub mod responses;
pub mod schema;

/// Request headers relevant to the WebDAV method handlers, parsed into
/// typed form. Values borrow from the underlying HTTP header map.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RequestHeaders<'x> {
    pub uri: &'x str,
    pub host: Option<&'x str>,
    pub depth: Depth,
    pub timeouts: Vec<Timeout>,
    pub content_type: Option<&'x str>,
    pub content_length: Option<u64>,
    pub destination: Option<&'x str>,
    pub lock_token: Option<&'x str>,
    pub range: Option<&'x str>,
    pub overwrite_fail: bool,
    pub if_: Vec<If<'x>>,
    pub invalid: Option<&'static str>,
}

/// Point-in-time state of a resource used to evaluate `If` conditions.
pub struct ResourceState<T: AsRef<str>> {
    pub resource: Option<T>,
    pub etag: T,
    pub state_token: T,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct If<'x> {
    pub resource: Option<&'x str>,
    pub list: Vec<Condition<'x>>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Condition<'x> {
    StateToken { is_not: bool, token: &'x str },
    ETag { is_not: bool, tag: &'x str },
    Exists { is_not: bool },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Timeout {
    Infinite,
    Second(u64),
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum Depth {
    Zero,
    One,
    Infinity,
    #[default]
    None,
}

impl RequestHeaders<'_> {
    pub fn has_if(&self) -> bool {
        !self.if_.is_empty()
    }

    /// Lock tokens submitted through the `If` header, in document order.
    pub fn submitted_state_tokens(&self) -> impl Iterator<Item = &str> {
        self.if_.iter().flat_map(|if_| {
            if_.list.iter().filter_map(|cond| match cond {
                Condition::StateToken {
                    is_not: false,
                    token,
                } => Some(*token),
                _ => None,
            })
        })
    }
}
