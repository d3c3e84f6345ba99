/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Data types shared between operations.

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::types::properties::PropertyPath;
use crate::xml::{
    bool_text, write_empty_element, write_end, write_start, write_text_element, XmlWrite,
};
use crate::Error;

/// The XML namespace for SOAP envelope elements.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/>
pub const SOAP_NS_URI: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// The XML namespace for EWS operation and response elements.
pub const MESSAGES_NS_URI: &str =
    "http://schemas.microsoft.com/exchange/services/2006/messages";

/// The XML namespace for EWS data types.
pub const TYPES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/types";

/// An identifier for a remote item.
///
/// Two identifiers are equal if and only if both the opaque server-assigned ID
/// and the change key match.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemid>
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ItemId {
    #[serde(rename = "@Id")]
    pub id: String,

    #[serde(rename = "@ChangeKey")]
    pub change_key: Option<String>,
}

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId {
            id: id.into(),
            change_key: None,
        }
    }
}

/// An identifier for a remote folder.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folderid>
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FolderId {
    #[serde(rename = "@Id")]
    pub id: String,

    #[serde(rename = "@ChangeKey")]
    pub change_key: Option<String>,
}

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        FolderId {
            id: id.into(),
            change_key: None,
        }
    }
}

/// An identifier for an item as provided in a request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemids>
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseItemId {
    /// An identifier for a standard item.
    ItemId { id: String, change_key: Option<String> },
}

impl From<&ItemId> for BaseItemId {
    fn from(value: &ItemId) -> Self {
        BaseItemId::ItemId {
            id: value.id.clone(),
            change_key: value.change_key.clone(),
        }
    }
}

impl XmlWrite for BaseItemId {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        match self {
            BaseItemId::ItemId { id, change_key } => {
                let mut attributes = vec![("Id", id.as_str())];
                if let Some(change_key) = change_key {
                    attributes.push(("ChangeKey", change_key.as_str()));
                }

                write_empty_element(writer, "t:ItemId", &attributes)
            }
        }
    }
}

/// An identifier for a folder as provided in a request.
///
/// A real folder identifier and a distinguished folder name are distinct kinds
/// and never compare equal, regardless of their contents.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folderids>
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseFolderId {
    /// An identifier for an arbitrary folder.
    FolderId { id: String, change_key: Option<String> },

    /// An identifier for a well-known folder.
    DistinguishedFolderId {
        id: DistinguishedFolderId,
        change_key: Option<String>,
    },
}

impl From<&FolderId> for BaseFolderId {
    fn from(value: &FolderId) -> Self {
        BaseFolderId::FolderId {
            id: value.id.clone(),
            change_key: value.change_key.clone(),
        }
    }
}

impl XmlWrite for BaseFolderId {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        match self {
            BaseFolderId::FolderId { id, change_key } => {
                let mut attributes = vec![("Id", id.as_str())];
                if let Some(change_key) = change_key {
                    attributes.push(("ChangeKey", change_key.as_str()));
                }

                write_empty_element(writer, "t:FolderId", &attributes)
            }

            BaseFolderId::DistinguishedFolderId { id, change_key } => {
                let mut attributes = vec![("Id", id.as_str())];
                if let Some(change_key) = change_key {
                    attributes.push(("ChangeKey", change_key.as_str()));
                }

                write_empty_element(writer, "t:DistinguishedFolderId", &attributes)
            }
        }
    }
}

/// A well-known folder name.
///
/// The set of names is fixed by the EWS schema; values outside of it are
/// unrepresentable.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/distinguishedfolderid>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistinguishedFolderId {
    Calendar,
    Contacts,
    DeletedItems,
    Drafts,
    Inbox,
    Journal,
    JunkEmail,
    MsgFolderRoot,
    Notes,
    Outbox,
    Root,
    SearchFolders,
    SentItems,
    Tasks,
    VoiceMail,
}

impl DistinguishedFolderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistinguishedFolderId::Calendar => "calendar",
            DistinguishedFolderId::Contacts => "contacts",
            DistinguishedFolderId::DeletedItems => "deleteditems",
            DistinguishedFolderId::Drafts => "drafts",
            DistinguishedFolderId::Inbox => "inbox",
            DistinguishedFolderId::Journal => "journal",
            DistinguishedFolderId::JunkEmail => "junkemail",
            DistinguishedFolderId::MsgFolderRoot => "msgfolderroot",
            DistinguishedFolderId::Notes => "notes",
            DistinguishedFolderId::Outbox => "outbox",
            DistinguishedFolderId::Root => "root",
            DistinguishedFolderId::SearchFolders => "searchfolders",
            DistinguishedFolderId::SentItems => "sentitems",
            DistinguishedFolderId::Tasks => "tasks",
            DistinguishedFolderId::VoiceMail => "voicemail",
        }
    }
}

/// A date and time with second precision, transferred as ISO 8601.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DateTime(#[serde(with = "time::serde::iso8601")] pub time::OffsetDateTime);

impl DateTime {
    /// Formats the value for inclusion in a request document.
    pub fn to_iso8601(&self) -> Result<String, Error> {
        self.0
            .format(&time::format_description::well_known::Iso8601::DEFAULT)
            .map_err(|err| Error::Processing {
                message: format!("unable to format date/time value: {err}"),
            })
    }
}

/// The base set of properties to fetch for an item or folder.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/baseshape>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BaseShape {
    /// Identifiers only.
    IdOnly,

    /// The default set of properties for the item or folder class.
    #[default]
    Default,

    /// All properties known to the server.
    AllProperties,
}

impl BaseShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseShape::IdOnly => "IdOnly",
            BaseShape::Default => "Default",
            BaseShape::AllProperties => "AllProperties",
        }
    }
}

/// The shape of folder data to include in a response.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/foldershape>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderShape {
    pub base_shape: BaseShape,
}

impl XmlWrite for FolderShape {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_start(writer, "m:FolderShape")?;
        write_text_element(writer, "t:BaseShape", self.base_shape.as_str())?;
        write_end(writer, "m:FolderShape")
    }
}

/// The shape of item data to include in a response.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemshape>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemShape {
    pub base_shape: BaseShape,

    pub include_mime_content: Option<bool>,

    /// Paths of properties to fetch in addition to the base shape.
    pub additional_properties: Vec<PropertyPath>,
}

impl XmlWrite for ItemShape {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_start(writer, "m:ItemShape")?;
        write_text_element(writer, "t:BaseShape", self.base_shape.as_str())?;

        if let Some(include_mime_content) = self.include_mime_content {
            write_text_element(writer, "t:IncludeMimeContent", bool_text(include_mime_content))?;
        }

        if !self.additional_properties.is_empty() {
            write_start(writer, "t:AdditionalProperties")?;
            for path in &self.additional_properties {
                path.write_xml(writer)?;
            }
            write_end(writer, "t:AdditionalProperties")?;
        }

        write_end(writer, "m:ItemShape")
    }
}

/// How a message-bearing operation should handle the affected message.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/messagedisposition>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageDisposition {
    SaveOnly,
    SendOnly,
    SendAndSaveCopy,
}

impl MessageDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDisposition::SaveOnly => "SaveOnly",
            MessageDisposition::SendOnly => "SendOnly",
            MessageDisposition::SendAndSaveCopy => "SendAndSaveCopy",
        }
    }
}

/// The Exchange schema version targeted by requests.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/requestserverversion>
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExchangeServerVersion {
    Exchange2007,
    Exchange2007_SP1,
    Exchange2010,
    Exchange2010_SP1,
    Exchange2010_SP2,
    Exchange2013,
    #[default]
    Exchange2013_SP1,
}

impl ExchangeServerVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeServerVersion::Exchange2007 => "Exchange2007",
            ExchangeServerVersion::Exchange2007_SP1 => "Exchange2007_SP1",
            ExchangeServerVersion::Exchange2010 => "Exchange2010",
            ExchangeServerVersion::Exchange2010_SP1 => "Exchange2010_SP1",
            ExchangeServerVersion::Exchange2010_SP2 => "Exchange2010_SP2",
            ExchangeServerVersion::Exchange2013 => "Exchange2013",
            ExchangeServerVersion::Exchange2013_SP1 => "Exchange2013_SP1",
        }
    }
}
