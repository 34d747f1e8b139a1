/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::Display;

use crate::parser::{RawElement, Token};
use crate::responses::XmlEscape;

use super::property::{DavProperty, DavValue, LockScope, LockType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropFind {
    PropName,
    AllProp(Vec<DavProperty>),
    Prop(Vec<DavProperty>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyUpdate {
    pub set: Vec<DavPropertyValue>,
    pub remove: Vec<DavProperty>,
    pub set_first: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    pub lock_scope: LockScope,
    pub lock_type: LockType,
    pub owner: Option<DeadProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavPropertyValue {
    pub property: DavProperty,
    pub value: DavValue,
}

/// An element the server has no schema for, kept as its wire name plus
/// a namespace declaration so it can be echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeadElementTag {
    pub name: String,
    pub attrs: Option<String>,
}

/// A property value fragment replayed token by token.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DeadProperty(pub Vec<DeadPropertyTag>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeadPropertyTag {
    ElementStart(DeadElementTag),
    Text(String),
    ElementEnd,
}

impl PropertyUpdate {
    pub fn has_changes(&self) -> bool {
        !self.set.is_empty() || !self.remove.is_empty()
    }
}

impl DavPropertyValue {
    pub fn new(property: impl Into<DavProperty>, value: impl Into<DavValue>) -> Self {
        DavPropertyValue {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn empty(property: impl Into<DavProperty>) -> Self {
        DavPropertyValue {
            property: property.into(),
            value: DavValue::Null,
        }
    }
}

impl DeadElementTag {
    pub fn new(name: String, attrs: Option<String>) -> Self {
        DeadElementTag { name, attrs }
    }
}

impl From<&RawElement<'_>> for DeadElementTag {
    fn from(raw: &RawElement<'_>) -> Self {
        let name = raw.element.name();
        let local = String::from_utf8_lossy(name.local_name().as_ref()).into_owned();
        let attrs = raw
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .map(|ns| format!("xmlns=\"{}\"", String::from_utf8_lossy(ns)));
        DeadElementTag::new(local, attrs)
    }
}

impl DeadProperty {
    pub fn size(&self) -> usize {
        self.0
            .iter()
            .map(|item| match item {
                DeadPropertyTag::ElementStart(tag) => {
                    tag.name.len() + tag.attrs.as_ref().map_or(0, |a| a.len() + 1)
                }
                DeadPropertyTag::Text(text) => text.len(),
                DeadPropertyTag::ElementEnd => 0,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, tag: DeadPropertyTag) {
        self.0.push(tag);
    }

    pub fn single_text(text: impl Into<String>) -> Self {
        DeadProperty(vec![DeadPropertyTag::Text(text.into())])
    }
}

impl Display for DeadElementTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(attrs) = &self.attrs {
            write!(f, "{} {}", self.name, attrs)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl Display for DeadProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stack = Vec::with_capacity(4);
        for item in &self.0 {
            match item {
                DeadPropertyTag::ElementStart(tag) => {
                    write!(f, "<{tag}>")?;
                    stack.push(tag.name.as_str());
                }
                DeadPropertyTag::Text(text) => {
                    text.write_escaped_to(f)?;
                }
                DeadPropertyTag::ElementEnd => {
                    if let Some(name) = stack.pop() {
                        write!(f, "</{name}>")?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<Token<'_>> for DeadPropertyTag {
    fn from(token: Token<'_>) -> Self {
        match token {
            Token::ElementStart { raw, .. } | Token::UnknownElement(raw) => {
                DeadPropertyTag::ElementStart((&raw).into())
            }
            Token::Text(text) => DeadPropertyTag::Text(text.into_owned()),
            Token::Bytes(bytes) => {
                DeadPropertyTag::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
            Token::ElementEnd | Token::Eof => DeadPropertyTag::ElementEnd,
        }
    }
}
