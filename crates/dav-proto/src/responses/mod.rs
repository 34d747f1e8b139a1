/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod error;
pub mod lock;
pub mod multistatus;
pub mod property;
pub mod propstat;

use std::fmt::Display;

use crate::schema::response::{Href, List, Location, ResponseDescription, Status};

pub trait XmlEscape {
    fn write_escaped_to(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result;
}

impl XmlEscape for str {
    fn write_escaped_to(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in self.chars() {
            match ch {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                _ => std::fmt::Write::write_char(f, ch)?,
            }
        }
        Ok(())
    }
}

pub(crate) trait XmlCdataEscape {
    fn write_cdata_escaped_to(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result;
}

impl XmlCdataEscape for str {
    fn write_cdata_escaped_to(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<![CDATA[{}]]>", self.replace("]]>", "]]&gt;"))
    }
}

impl<T: Display> Display for List<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for item in &self.0 {
            item.fmt(f)?;
        }
        Ok(())
    }
}

impl Display for Href {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<D:href>")?;
        self.0.write_escaped_to(f)?;
        f.write_str("</D:href>")
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<D:status>HTTP/1.1 {} {}</D:status>",
            self.0.as_u16(),
            self.0.canonical_reason().unwrap_or_default()
        )
    }
}

impl Display for ResponseDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<D:responsedescription>")?;
        self.0.write_escaped_to(f)?;
        f.write_str("</D:responsedescription>")
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<D:location>{}</D:location>", self.0)
    }
}
