/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Item data structures.

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::types::common::{DateTime, FolderId, ItemId};
use crate::types::properties::{ExtendedProperty, PropertyMap};
use crate::xml::{bool_text, write_end, write_start, write_text_element, XmlWrite};
use crate::Error;

/// The properties of an item, shared between all item classes.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ItemData {
    pub item_id: Option<ItemId>,

    pub parent_folder_id: Option<FolderId>,

    /// The MAPI class of the item, e.g. `IPM.Note`.
    pub item_class: Option<String>,

    pub subject: Option<String>,

    pub date_time_received: Option<DateTime>,

    pub date_time_sent: Option<DateTime>,

    pub last_modified_time: Option<DateTime>,

    pub is_read: Option<bool>,

    pub has_attachments: Option<bool>,

    pub size: Option<u64>,

    pub internet_message_id: Option<String>,

    #[serde(rename = "ExtendedProperty", default)]
    pub extended_property: Vec<ExtendedProperty>,
}

/// An item, tagged with its class-specific element name.
///
/// The recognized element names are fixed by the EWS schema, but servers may
/// introduce classes this client does not know; those deserialize into
/// [`Item::Unknown`] so that one novel item cannot fail a whole listing.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/items>
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    CalendarItem(ItemData),
    Contact(ItemData),
    DistributionList(ItemData),
    Item(ItemData),
    MeetingCancellation(ItemData),
    MeetingMessage(ItemData),
    MeetingRequest(ItemData),
    MeetingResponse(ItemData),
    Message(ItemData),
    PostItem(ItemData),
    Task(ItemData),

    /// An element name outside the recognized set, with its content
    /// discarded. Callers skip these at classification time.
    Unknown(String),
}

impl<'de> serde::Deserialize<'de> for Item {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{EnumAccess, IgnoredAny, VariantAccess, Visitor};

        struct ItemVisitor;

        impl<'de> Visitor<'de> for ItemVisitor {
            type Value = Item;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("an item element")
            }

            fn visit_enum<A>(self, data: A) -> Result<Self::Value, A::Error>
            where
                A: EnumAccess<'de>,
            {
                let (name, variant) = data.variant::<String>()?;

                Ok(match name.as_str() {
                    "CalendarItem" => Item::CalendarItem(variant.newtype_variant()?),
                    "Contact" => Item::Contact(variant.newtype_variant()?),
                    "DistributionList" => Item::DistributionList(variant.newtype_variant()?),
                    "Item" => Item::Item(variant.newtype_variant()?),
                    "MeetingCancellation" => {
                        Item::MeetingCancellation(variant.newtype_variant()?)
                    }
                    "MeetingMessage" => Item::MeetingMessage(variant.newtype_variant()?),
                    "MeetingRequest" => Item::MeetingRequest(variant.newtype_variant()?),
                    "MeetingResponse" => Item::MeetingResponse(variant.newtype_variant()?),
                    "Message" => Item::Message(variant.newtype_variant()?),
                    "PostItem" => Item::PostItem(variant.newtype_variant()?),
                    "Task" => Item::Task(variant.newtype_variant()?),

                    _ => {
                        variant.newtype_variant::<IgnoredAny>()?;
                        Item::Unknown(name)
                    }
                })
            }
        }

        const VARIANTS: &[&str] = &[
            "CalendarItem",
            "Contact",
            "DistributionList",
            "Item",
            "MeetingCancellation",
            "MeetingMessage",
            "MeetingRequest",
            "MeetingResponse",
            "Message",
            "PostItem",
            "Task",
        ];

        deserializer.deserialize_enum("Item", VARIANTS, ItemVisitor)
    }
}

impl Item {
    /// The item's properties, for recognized item classes.
    pub fn inner(&self) -> Option<&ItemData> {
        match self {
            Item::CalendarItem(data)
            | Item::Contact(data)
            | Item::DistributionList(data)
            | Item::Item(data)
            | Item::MeetingCancellation(data)
            | Item::MeetingMessage(data)
            | Item::MeetingRequest(data)
            | Item::MeetingResponse(data)
            | Item::Message(data)
            | Item::PostItem(data)
            | Item::Task(data) => Some(data),

            Item::Unknown(_) => None,
        }
    }

    pub fn into_inner(self) -> Option<ItemData> {
        match self {
            Item::CalendarItem(data)
            | Item::Contact(data)
            | Item::DistributionList(data)
            | Item::Item(data)
            | Item::MeetingCancellation(data)
            | Item::MeetingMessage(data)
            | Item::MeetingRequest(data)
            | Item::MeetingResponse(data)
            | Item::Message(data)
            | Item::PostItem(data)
            | Item::Task(data) => Some(data),

            Item::Unknown(_) => None,
        }
    }

    /// Classifies the item for synchronization purposes.
    ///
    /// The meeting message family is handled by the same consumers as plain
    /// messages and collapses into [`ItemKind::Message`]. Returns `None` for
    /// item classes which are not synchronized.
    pub fn kind(&self) -> Option<ItemKind> {
        match self {
            Item::Message(_)
            | Item::MeetingCancellation(_)
            | Item::MeetingMessage(_)
            | Item::MeetingRequest(_)
            | Item::MeetingResponse(_) => Some(ItemKind::Message),

            Item::CalendarItem(_) => Some(ItemKind::Calendar),

            Item::Contact(_) | Item::DistributionList(_) => Some(ItemKind::Contact),

            Item::Task(_) => Some(ItemKind::Task),

            Item::Item(_) | Item::PostItem(_) | Item::Unknown(_) => None,
        }
    }

    fn element_name(&self) -> Option<&'static str> {
        match self {
            Item::CalendarItem(_) => Some("t:CalendarItem"),
            Item::Contact(_) => Some("t:Contact"),
            Item::DistributionList(_) => Some("t:DistributionList"),
            Item::Item(_) => Some("t:Item"),
            Item::MeetingCancellation(_) => Some("t:MeetingCancellation"),
            Item::MeetingMessage(_) => Some("t:MeetingMessage"),
            Item::MeetingRequest(_) => Some("t:MeetingRequest"),
            Item::MeetingResponse(_) => Some("t:MeetingResponse"),
            Item::Message(_) => Some("t:Message"),
            Item::PostItem(_) => Some("t:PostItem"),
            Item::Task(_) => Some("t:Task"),
            Item::Unknown(_) => None,
        }
    }
}

impl XmlWrite for Item {
    // Only writable creation-time properties are emitted; identifiers and
    // server-maintained fields are omitted.
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        let (Some(name), Some(data)) = (self.element_name(), self.inner()) else {
            return Err(Error::Processing {
                message: "cannot write an item of unrecognized class".to_string(),
            });
        };

        write_start(writer, name)?;
        if let Some(item_class) = &data.item_class {
            write_text_element(writer, "t:ItemClass", item_class)?;
        }
        if let Some(subject) = &data.subject {
            write_text_element(writer, "t:Subject", subject)?;
        }
        for property in &data.extended_property {
            property.write_xml(writer)?;
        }
        if let Some(is_read) = data.is_read {
            write_text_element(writer, "t:IsRead", bool_text(is_read))?;
        }
        write_end(writer, name)
    }
}

/// A list of items within a response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Items {
    #[serde(rename = "$value", default)]
    pub inner: Vec<Item>,
}

/// The synchronization bucket an item belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Message,
    Calendar,
    Contact,
    Task,
}

impl ItemKind {
    /// The wire element name used when writing an item of this kind into a
    /// request.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ItemKind::Message => "Message",
            ItemKind::Calendar => "CalendarItem",
            ItemKind::Contact => "Contact",
            ItemKind::Task => "Task",
        }
    }
}

/// A working record for a single remote item whose identity has been parsed.
///
/// Records are only constructed from items which carried an identifier;
/// downstream consumers can rely on `item_id` being valid.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemRecord {
    pub kind: ItemKind,

    pub item_id: ItemId,

    pub parent_folder_id: Option<FolderId>,

    pub properties: PropertyMap,
}

impl ItemRecord {
    /// Builds a record from a listed item.
    ///
    /// Returns `Ok(None)` for item classes which are not synchronized, so
    /// that callers can skip them, and fails if the item carries no
    /// identifier.
    pub fn try_from_item(item: Item) -> Result<Option<ItemRecord>, Error> {
        let Some(kind) = item.kind() else {
            return Ok(None);
        };

        let Some(data) = item.into_inner() else {
            return Ok(None);
        };
        let item_id = data.item_id.ok_or(Error::MissingIdInResponse)?;

        Ok(Some(ItemRecord {
            kind,
            item_id,
            parent_folder_id: data.parent_folder_id,
            properties: PropertyMap::new(),
        }))
    }
}
