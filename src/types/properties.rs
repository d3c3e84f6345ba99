/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Property addressing and values.
//!
//! Items carry both well-known properties (addressed by field URI) and
//! extended MAPI properties (addressed by property set/tag). A property's
//! absence is meaningful and is never conflated with a default value.

use std::io::Write;

use base64::prelude::{Engine, BASE64_STANDARD};
use quick_xml::Writer;
use serde::Deserialize;

use crate::types::common::{DateTime, ItemId};
use crate::xml::{write_empty_element, XmlWrite};
use crate::Error;

/// The path to a property on an item or folder.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/fielduri>
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyPath {
    /// A well-known property, e.g. `item:Subject`.
    FieldUri { field_uri: String },

    /// A single member of a well-known dictionary property, e.g. a specific
    /// entry of `contacts:EmailAddress`.
    IndexedFieldUri {
        field_uri: String,
        field_index: String,
    },

    /// An extended MAPI property.
    ExtendedFieldUri(ExtendedFieldUri),
}

impl PropertyPath {
    pub fn field_uri(uri: impl Into<String>) -> Self {
        PropertyPath::FieldUri {
            field_uri: uri.into(),
        }
    }

    /// The element name used when setting a well-known field on an item, i.e.
    /// the final segment of the field URI.
    pub(crate) fn field_element_name(&self) -> Option<&str> {
        match self {
            PropertyPath::FieldUri { field_uri }
            | PropertyPath::IndexedFieldUri { field_uri, .. } => {
                field_uri.rsplit(':').next().or(Some(field_uri.as_str()))
            }
            PropertyPath::ExtendedFieldUri(_) => None,
        }
    }
}

impl XmlWrite for PropertyPath {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        match self {
            PropertyPath::FieldUri { field_uri } => {
                write_empty_element(writer, "t:FieldURI", &[("FieldURI", field_uri.as_str())])
            }

            PropertyPath::IndexedFieldUri {
                field_uri,
                field_index,
            } => write_empty_element(
                writer,
                "t:IndexedFieldURI",
                &[
                    ("FieldURI", field_uri.as_str()),
                    ("FieldIndex", field_index.as_str()),
                ],
            ),

            PropertyPath::ExtendedFieldUri(extended) => extended.write_xml(writer),
        }
    }
}

/// The identifier of an extended MAPI property.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/extendedfielduri>
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ExtendedFieldUri {
    #[serde(rename = "@DistinguishedPropertySetId")]
    pub distinguished_property_set_id: Option<DistinguishedPropertySet>,

    #[serde(rename = "@PropertySetId")]
    pub property_set_id: Option<String>,

    #[serde(rename = "@PropertyTag")]
    pub property_tag: Option<String>,

    #[serde(rename = "@PropertyName")]
    pub property_name: Option<String>,

    #[serde(rename = "@PropertyId")]
    pub property_id: Option<i32>,

    #[serde(rename = "@PropertyType")]
    pub property_type: Option<PropertyType>,
}

impl XmlWrite for ExtendedFieldUri {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        let property_id = self.property_id.map(|id| id.to_string());

        let mut attributes: Vec<(&str, &str)> = Vec::new();
        if let Some(set) = &self.distinguished_property_set_id {
            attributes.push(("DistinguishedPropertySetId", set.as_str()));
        }
        if let Some(set_id) = &self.property_set_id {
            attributes.push(("PropertySetId", set_id.as_str()));
        }
        if let Some(tag) = &self.property_tag {
            attributes.push(("PropertyTag", tag.as_str()));
        }
        if let Some(name) = &self.property_name {
            attributes.push(("PropertyName", name.as_str()));
        }
        if let Some(id) = &property_id {
            attributes.push(("PropertyId", id.as_str()));
        }
        if let Some(property_type) = &self.property_type {
            attributes.push(("PropertyType", property_type.as_str()));
        }

        write_empty_element(writer, "t:ExtendedFieldURI", &attributes)
    }
}

/// A well-known MAPI property set.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum DistinguishedPropertySet {
    Address,
    Appointment,
    CalendarAssistant,
    Common,
    InternetHeaders,
    Meeting,
    PublicStrings,
    Sharing,
    Task,
    UnifiedMessaging,
}

impl DistinguishedPropertySet {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistinguishedPropertySet::Address => "Address",
            DistinguishedPropertySet::Appointment => "Appointment",
            DistinguishedPropertySet::CalendarAssistant => "CalendarAssistant",
            DistinguishedPropertySet::Common => "Common",
            DistinguishedPropertySet::InternetHeaders => "InternetHeaders",
            DistinguishedPropertySet::Meeting => "Meeting",
            DistinguishedPropertySet::PublicStrings => "PublicStrings",
            DistinguishedPropertySet::Sharing => "Sharing",
            DistinguishedPropertySet::Task => "Task",
            DistinguishedPropertySet::UnifiedMessaging => "UnifiedMessaging",
        }
    }
}

/// The type of an extended property value.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    ApplicationTime,
    Binary,
    Boolean,
    CLSID,
    Currency,
    Double,
    Float,
    Integer,
    Long,
    Short,
    String,
    SystemTime,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::ApplicationTime => "ApplicationTime",
            PropertyType::Binary => "Binary",
            PropertyType::Boolean => "Boolean",
            PropertyType::CLSID => "CLSID",
            PropertyType::Currency => "Currency",
            PropertyType::Double => "Double",
            PropertyType::Float => "Float",
            PropertyType::Integer => "Integer",
            PropertyType::Long => "Long",
            PropertyType::Short => "Short",
            PropertyType::String => "String",
            PropertyType::SystemTime => "SystemTime",
        }
    }
}

/// A typed property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    DateTime(DateTime),
    Id(ItemId),
    Binary(Vec<u8>),
    StringList(Vec<String>),
}

impl PropertyValue {
    /// Formats the value as element text for a request document.
    pub fn to_text(&self) -> Result<String, Error> {
        Ok(match self {
            PropertyValue::String(value) => value.clone(),
            PropertyValue::Integer(value) => value.to_string(),
            PropertyValue::Boolean(value) => crate::xml::bool_text(*value).to_string(),
            PropertyValue::DateTime(value) => value.to_iso8601()?,
            PropertyValue::Id(value) => value.id.clone(),
            PropertyValue::Binary(value) => BASE64_STANDARD.encode(value),
            PropertyValue::StringList(values) => values.join(";"),
        })
    }
}

/// An extended property and its value, as returned on items and folders.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/extendedproperty>
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ExtendedProperty {
    #[serde(rename = "ExtendedFieldURI")]
    pub extended_field_uri: ExtendedFieldUri,

    pub value: Option<String>,
}

impl XmlWrite for ExtendedProperty {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        crate::xml::write_start(writer, "t:ExtendedProperty")?;
        self.extended_field_uri.write_xml(writer)?;
        if let Some(value) = &self.value {
            crate::xml::write_text_element(writer, "t:Value", value)?;
        }
        crate::xml::write_end(writer, "t:ExtendedProperty")
    }
}

/// An insertion-ordered mapping from property paths to values.
///
/// Setting a path which is already present replaces the value in place,
/// preserving the original position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(PropertyPath, PropertyValue)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &PropertyPath) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(entry_path, _)| entry_path == path)
            .map(|(_, value)| value)
    }

    pub fn set(&mut self, path: PropertyPath, value: PropertyValue) {
        match self
            .entries
            .iter_mut()
            .find(|(entry_path, _)| *entry_path == path)
        {
            Some((_, entry_value)) => *entry_value = value,
            None => self.entries.push((path, value)),
        }
    }

    pub fn remove(&mut self, path: &PropertyPath) -> Option<PropertyValue> {
        let index = self
            .entries
            .iter()
            .position(|(entry_path, _)| entry_path == path)?;

        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PropertyPath, PropertyValue)> {
        self.entries.iter()
    }
}
