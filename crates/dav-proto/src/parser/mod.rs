/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod header;
pub mod property;
pub mod tokenizer;

use std::borrow::Cow;
use std::fmt::Display;

use quick_xml::events::BytesStart;

use crate::schema::NamedElement;

use self::tokenizer::Tokenizer;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Xml(Box<quick_xml::Error>),
    UnexpectedToken(Box<UnexpectedToken>),
}

#[derive(Debug)]
pub struct UnexpectedToken {
    pub expected: Option<Token<'static>>,
    pub found: Token<'static>,
}

#[derive(Debug)]
pub enum Token<'x> {
    ElementStart {
        name: NamedElement,
        raw: RawElement<'x>,
    },
    UnknownElement(RawElement<'x>),
    Text(Cow<'x, str>),
    Bytes(Cow<'x, [u8]>),
    ElementEnd,
    Eof,
}

/// The undecoded element as it appeared on the wire, kept for dead
/// properties and diagnostics.
#[derive(Debug)]
pub struct RawElement<'x> {
    pub element: BytesStart<'x>,
    pub namespace: Option<Vec<u8>>,
}

impl<'x> RawElement<'x> {
    pub fn new(element: BytesStart<'x>) -> Self {
        RawElement {
            element,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl AsRef<[u8]>) -> Self {
        self.namespace = Some(namespace.as_ref().to_vec());
        self
    }

    pub fn into_owned(self) -> RawElement<'static> {
        RawElement {
            element: self.element.into_owned(),
            namespace: self.namespace,
        }
    }
}

impl Default for RawElement<'_> {
    fn default() -> Self {
        RawElement {
            element: BytesStart::new(""),
            namespace: None,
        }
    }
}

/// A request body that can be parsed from a token stream.
pub trait DavParser: Sized {
    fn parse(stream: &mut Tokenizer<'_>) -> Result<Self>;
}

impl Token<'_> {
    pub fn into_owned(self) -> Token<'static> {
        match self {
            Token::ElementStart { name, raw } => Token::ElementStart {
                name,
                raw: raw.into_owned(),
            },
            Token::UnknownElement(raw) => Token::UnknownElement(raw.into_owned()),
            Token::Text(text) => Token::Text(text.into_owned().into()),
            Token::Bytes(bytes) => Token::Bytes(bytes.into_owned().into()),
            Token::ElementEnd => Token::ElementEnd,
            Token::Eof => Token::Eof,
        }
    }

    pub fn into_unexpected(self) -> Error {
        Error::UnexpectedToken(Box::new(UnexpectedToken {
            expected: None,
            found: self.into_owned(),
        }))
    }
}

impl NamedElement {
    pub fn into_unexpected(self) -> Error {
        Error::UnexpectedToken(Box::new(UnexpectedToken {
            expected: None,
            found: Token::ElementStart {
                name: self,
                raw: RawElement::default(),
            },
        }))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Xml(err) => write!(f, "XML parse error: {err}"),
            Error::UnexpectedToken(err) => match &err.expected {
                Some(expected) => {
                    write!(f, "expected {expected:?}, found {:?}", err.found)
                }
                None => write!(f, "unexpected {:?}", err.found),
            },
        }
    }
}

impl std::error::Error for Error {}
