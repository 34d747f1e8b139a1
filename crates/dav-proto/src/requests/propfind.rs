/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    parser::{tokenizer::Tokenizer, DavParser, Token},
    schema::{request::PropFind, Element, NamedElement, Namespace},
};

impl DavParser for PropFind {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        // No body means allprop
        if !stream.expect_named_element_or_eof(NamedElement::dav(Element::Propfind))? {
            return Ok(PropFind::AllProp(Vec::new()));
        }

        let mut propfind = PropFind::AllProp(Vec::new());

        loop {
            match stream.token()? {
                Token::ElementStart {
                    name:
                        NamedElement {
                            ns: Namespace::Dav,
                            element: Element::Propname,
                        },
                    ..
                } => {
                    stream.seek_element_end()?;
                    propfind = PropFind::PropName;
                }
                Token::ElementStart {
                    name:
                        NamedElement {
                            ns: Namespace::Dav,
                            element: Element::Allprop,
                        },
                    ..
                } => {
                    stream.seek_element_end()?;
                }
                Token::ElementStart {
                    name:
                        NamedElement {
                            ns: Namespace::Dav,
                            element: Element::Include,
                        },
                    ..
                } => {
                    if let PropFind::AllProp(include) = &mut propfind {
                        *include = stream.collect_properties(std::mem::take(include))?;
                    } else {
                        stream.seek_element_end()?;
                    }
                }
                Token::ElementStart {
                    name:
                        NamedElement {
                            ns: Namespace::Dav,
                            element: Element::Prop,
                        },
                    ..
                } => {
                    propfind = PropFind::Prop(stream.collect_properties(Vec::with_capacity(4))?);
                }
                Token::ElementEnd | Token::Eof => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(propfind)
    }
}
