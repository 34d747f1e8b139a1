/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::schema::{
    property::{DavProperty, DavValue},
    request::{DavPropertyValue, DeadProperty, DeadPropertyTag},
};

use super::{tokenizer::Tokenizer, Token};

impl Tokenizer<'_> {
    /// Collects the children of a `<D:prop>` element as property names.
    /// Unknown elements become dead properties.
    pub(crate) fn collect_properties(
        &mut self,
        mut elements: Vec<DavProperty>,
    ) -> crate::parser::Result<Vec<DavProperty>> {
        loop {
            match self.token()? {
                Token::ElementStart { name, .. } => {
                    if let Some(property) = DavProperty::from_element(name) {
                        elements.push(property);
                    }
                    self.seek_element_end()?;
                }
                Token::UnknownElement(raw) => {
                    elements.push(DavProperty::DeadProperty((&raw).into()));
                    self.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(elements)
    }

    /// Collects the children of a `<D:prop>` element as property values,
    /// as they appear in a `propertyupdate` set block.
    pub(crate) fn collect_property_values(
        &mut self,
        values: &mut Vec<DavPropertyValue>,
    ) -> crate::parser::Result<()> {
        loop {
            match self.token()? {
                Token::ElementStart { name, .. } => {
                    let value = self
                        .collect_string_value()?
                        .map(DavValue::String)
                        .unwrap_or(DavValue::Null);
                    if let Some(property) = DavProperty::from_element(name) {
                        values.push(DavPropertyValue { property, value });
                    }
                }
                Token::UnknownElement(raw) => {
                    let property = DavProperty::DeadProperty((&raw).into());
                    values.push(DavPropertyValue {
                        property,
                        value: DavValue::DeadProperty(self.collect_dead_fragment()?),
                    });
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(())
    }

    /// Captures an XML fragment verbatim until the current element closes.
    pub(crate) fn collect_dead_fragment(&mut self) -> crate::parser::Result<DeadProperty> {
        let mut fragment = DeadProperty::default();
        let mut depth = 1;

        loop {
            let token = self.token()?;
            match &token {
                Token::ElementStart { .. } | Token::UnknownElement(_) => depth += 1,
                Token::ElementEnd => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Token::Eof => return Err(Token::Eof.into_unexpected()),
                _ => {}
            }
            fragment.push(DeadPropertyTag::from(token));
        }

        Ok(fragment)
    }
}
