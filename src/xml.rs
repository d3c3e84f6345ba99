/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Helpers for writing request XML.
//!
//! Requests are emitted by hand with [`quick_xml::Writer`] events so that
//! element order, namespace prefixes and attribute placement exactly match
//! what Exchange expects. Types which appear in request bodies implement
//! [`XmlWrite`].

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::Error;

/// A type which can write itself into a request document.
pub(crate) trait XmlWrite {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error>;
}

impl<T> XmlWrite for &T
where
    T: XmlWrite,
{
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        (*self).write_xml(writer)
    }
}

/// Writes an element with text content, e.g. `<t:Subject>Hello</t:Subject>`.
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;

    Ok(())
}

/// Writes an empty element carrying only attributes, e.g.
/// `<t:FolderId Id="..." ChangeKey="..."/>`.
pub(crate) fn write_empty_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
) -> Result<(), Error> {
    let mut start = BytesStart::new(name);
    for (attr_name, attr_value) in attributes {
        start.push_attribute((*attr_name, *attr_value));
    }

    writer.write_event(Event::Empty(start))?;

    Ok(())
}

pub(crate) fn write_start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;

    Ok(())
}

pub(crate) fn write_start_with_attributes<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
) -> Result<(), Error> {
    let mut start = BytesStart::new(name);
    for (attr_name, attr_value) in attributes {
        start.push_attribute((*attr_name, *attr_value));
    }

    writer.write_event(Event::Start(start))?;

    Ok(())
}

pub(crate) fn write_end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;

    Ok(())
}

/// Formats a boolean the way the EWS schema expects.
pub(crate) fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use quick_xml::Writer;

    use super::*;

    #[test]
    fn text_element_escapes_content() {
        let mut writer = Writer::new(Vec::new());
        write_text_element(&mut writer, "t:Subject", "Fish & Chips <today>")
            .expect("writing should succeed");

        let actual = String::from_utf8(writer.into_inner()).expect("output should be UTF-8");
        assert_eq!(
            actual, "<t:Subject>Fish &amp; Chips &lt;today&gt;</t:Subject>",
            "special characters should be escaped"
        );
    }

    #[test]
    fn empty_element_writes_attributes_in_order() {
        let mut writer = Writer::new(Vec::new());
        write_empty_element(
            &mut writer,
            "t:FolderId",
            &[("Id", "AAMkAD"), ("ChangeKey", "AQAAAB")],
        )
        .expect("writing should succeed");

        let actual = String::from_utf8(writer.into_inner()).expect("output should be UTF-8");
        assert_eq!(actual, r#"<t:FolderId Id="AAMkAD" ChangeKey="AQAAAB"/>"#);
    }
}
