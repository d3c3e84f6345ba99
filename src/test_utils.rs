/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Utilities for testing (de)serialization of EWS data structures.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Writer;
use serde::de::DeserializeOwned;

use crate::operations::Operation;
use crate::xml::XmlWrite;

/// Serializes a request data structure and returns the resulting document
/// fragment as a string.
pub(crate) fn serialize_content<T: XmlWrite>(value: &T) -> String {
    let mut writer = Writer::new(Vec::new());
    value
        .write_xml(&mut writer)
        .expect("serialization into an in-memory buffer should succeed");

    String::from_utf8(writer.into_inner()).expect("serialized content should be valid UTF-8")
}

/// Serializes an operation's body element, without the surrounding SOAP
/// envelope, and returns it as a string.
pub(crate) fn serialize_operation<Op: Operation>(op: &Op) -> String {
    let mut writer = Writer::new(Vec::new());

    let name = format!("m:{}", Op::NAME);
    let attributes = op.attributes();
    let mut start = BytesStart::new(name.as_str());
    for (attr_name, attr_value) in &attributes {
        start.push_attribute((*attr_name, attr_value.as_str()));
    }

    writer
        .write_event(Event::Start(start))
        .expect("writing into an in-memory buffer should succeed");
    op.write_children(&mut writer)
        .expect("writing into an in-memory buffer should succeed");
    writer
        .write_event(Event::End(quick_xml::events::BytesEnd::new(name.as_str())))
        .expect("writing into an in-memory buffer should succeed");

    String::from_utf8(writer.into_inner()).expect("serialized content should be valid UTF-8")
}

/// Deserializes a response data structure from an XML fragment.
pub(crate) fn deserialize_content<T: DeserializeOwned>(xml: &str) -> T {
    quick_xml::de::from_str(xml).expect("deserialization should succeed")
}
