/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::{BaseFolderId, ItemShape};
use crate::types::items::Items;
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{write_empty_element, write_end, write_start, XmlWrite};
use crate::Error;

/// A request to list the items contained in a folder.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/finditem>
#[derive(Clone, Debug)]
pub struct FindItem {
    pub traversal: Traversal,

    pub item_shape: ItemShape,

    /// The window of results to return.
    ///
    /// Listings of large folders must be paged; in particular, calendar
    /// folders collapse recurring series into single entries when listed
    /// without paging.
    pub paging: Option<Paging>,

    pub parent_folder_ids: Vec<BaseFolderId>,
}

impl Operation for FindItem {
    type Response = FindItemResponse;

    const NAME: &'static str = "FindItem";

    fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![("Traversal", self.traversal.as_str().to_string())]
    }

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        self.item_shape.write_xml(writer)?;

        if let Some(paging) = &self.paging {
            paging.write_xml(writer)?;
        }

        write_start(writer, "m:ParentFolderIds")?;
        for folder_id in &self.parent_folder_ids {
            folder_id.write_xml(writer)?;
        }
        write_end(writer, "m:ParentFolderIds")
    }
}

/// The manner in which a folder's contents are traversed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Traversal {
    #[default]
    Shallow,
    Deep,
    SoftDeleted,
    Associated,
}

impl Traversal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Traversal::Shallow => "Shallow",
            Traversal::Deep => "Deep",
            Traversal::SoftDeleted => "SoftDeleted",
            Traversal::Associated => "Associated",
        }
    }
}

/// A window of results to return from a listing.
///
/// The two paging schemes are mutually exclusive; a request carries at most
/// one.
#[derive(Clone, Debug, PartialEq)]
pub enum Paging {
    /// Offset-based paging.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/indexedpageitemview>
    IndexedPageItemView {
        max_entries_returned: Option<u32>,
        offset: i32,
        base_point: BasePoint,
    },

    /// Fraction-based paging.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/fractionalpageitemview>
    FractionalPageItemView {
        max_entries_returned: Option<u32>,
        numerator: u32,
        denominator: u32,
    },
}

impl XmlWrite for Paging {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        match self {
            Paging::IndexedPageItemView {
                max_entries_returned,
                offset,
                base_point,
            } => {
                let max_entries = max_entries_returned.map(|max| max.to_string());
                let offset = offset.to_string();

                let mut attributes: Vec<(&str, &str)> = Vec::new();
                if let Some(max_entries) = &max_entries {
                    attributes.push(("MaxEntriesReturned", max_entries.as_str()));
                }
                attributes.push(("Offset", offset.as_str()));
                attributes.push(("BasePoint", base_point.as_str()));

                write_empty_element(writer, "m:IndexedPageItemView", &attributes)
            }

            Paging::FractionalPageItemView {
                max_entries_returned,
                numerator,
                denominator,
            } => {
                let max_entries = max_entries_returned.map(|max| max.to_string());
                let numerator = numerator.to_string();
                let denominator = denominator.to_string();

                let mut attributes: Vec<(&str, &str)> = Vec::new();
                if let Some(max_entries) = &max_entries {
                    attributes.push(("MaxEntriesReturned", max_entries.as_str()));
                }
                attributes.push(("Numerator", numerator.as_str()));
                attributes.push(("Denominator", denominator.as_str()));

                write_empty_element(writer, "m:FractionalPageItemView", &attributes)
            }
        }
    }
}

/// The end of a result set from which an indexed page's offset is counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BasePoint {
    #[default]
    Beginning,
    End,
}

impl BasePoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            BasePoint::Beginning => "Beginning",
            BasePoint::End => "End",
        }
    }
}

/// A response to a [`FindItem`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FindItemResponse {
    pub response_messages: FindItemResponseMessages,
}

impl OperationResponse for FindItemResponse {
    type Message = FindItemResponseMessage;

    const NAME: &'static str = "FindItemResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.find_item_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.find_item_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FindItemResponseMessages {
    #[serde(default)]
    pub find_item_response_message: Vec<FindItemResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FindItemResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub root_folder: Option<RootFolder>,
}

impl_response_message!(FindItemResponseMessage);

/// The listed contents of a folder, with paging information.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/rootfolder-finditemresponsemessage>
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RootFolder {
    /// The offset at which the next indexed page should start.
    #[serde(rename = "@IndexedPagingOffset")]
    pub indexed_paging_offset: Option<i32>,

    #[serde(rename = "@NumeratorOffset")]
    pub numerator_offset: Option<u32>,

    #[serde(rename = "@AbsoluteDenominator")]
    pub absolute_denominator: Option<u32>,

    /// Whether this page reaches the end of the result set.
    #[serde(rename = "@IncludesLastItemInRange")]
    pub includes_last_item_in_range: bool,

    #[serde(rename = "@TotalItemsInView")]
    pub total_items_in_view: u32,

    #[serde(default)]
    pub items: Items,
}

#[cfg(test)]
mod tests {
    use crate::test_utils::serialize_operation;
    use crate::types::common::{BaseShape, DistinguishedFolderId};
    use crate::types::items::ItemKind;
    use crate::types::soap::Envelope;

    use super::*;

    #[test]
    fn serialize_find_item_with_indexed_paging() {
        let op = FindItem {
            traversal: Traversal::Shallow,
            item_shape: ItemShape {
                base_shape: BaseShape::IdOnly,
                ..Default::default()
            },
            paging: Some(Paging::IndexedPageItemView {
                max_entries_returned: Some(100),
                offset: 0,
                base_point: BasePoint::Beginning,
            }),
            parent_folder_ids: vec![BaseFolderId::DistinguishedFolderId {
                id: DistinguishedFolderId::Inbox,
                change_key: None,
            }],
        };

        let expected = concat!(
            r#"<m:FindItem Traversal="Shallow">"#,
            "<m:ItemShape><t:BaseShape>IdOnly</t:BaseShape></m:ItemShape>",
            r#"<m:IndexedPageItemView MaxEntriesReturned="100" Offset="0" BasePoint="Beginning"/>"#,
            r#"<m:ParentFolderIds><t:DistinguishedFolderId Id="inbox"/></m:ParentFolderIds>"#,
            "</m:FindItem>",
        );

        assert_eq!(serialize_operation(&op), expected);
    }

    #[test]
    fn serialize_find_item_with_deep_traversal() {
        let op = FindItem {
            traversal: Traversal::Deep,
            item_shape: ItemShape {
                base_shape: BaseShape::IdOnly,
                ..Default::default()
            },
            paging: None,
            parent_folder_ids: vec![BaseFolderId::FolderId {
                id: "AQMkAA==".to_string(),
                change_key: None,
            }],
        };

        let expected = concat!(
            r#"<m:FindItem Traversal="Deep">"#,
            "<m:ItemShape><t:BaseShape>IdOnly</t:BaseShape></m:ItemShape>",
            r#"<m:ParentFolderIds><t:FolderId Id="AQMkAA=="/></m:ParentFolderIds>"#,
            "</m:FindItem>",
        );

        assert_eq!(serialize_operation(&op), expected);
    }

    #[test]
    fn serialize_find_item_with_fractional_paging() {
        let op = FindItem {
            traversal: Traversal::Shallow,
            item_shape: ItemShape::default(),
            paging: Some(Paging::FractionalPageItemView {
                max_entries_returned: None,
                numerator: 1,
                denominator: 4,
            }),
            parent_folder_ids: vec![BaseFolderId::FolderId {
                id: "AQMkAA==".to_string(),
                change_key: None,
            }],
        };

        let expected = concat!(
            r#"<m:FindItem Traversal="Shallow">"#,
            "<m:ItemShape><t:BaseShape>Default</t:BaseShape></m:ItemShape>",
            r#"<m:FractionalPageItemView Numerator="1" Denominator="4"/>"#,
            r#"<m:ParentFolderIds><t:FolderId Id="AQMkAA=="/></m:ParentFolderIds>"#,
            "</m:FindItem>",
        );

        assert_eq!(serialize_operation(&op), expected);
    }

    #[test]
    fn deserialize_find_item_response_with_paging_attributes() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
              <s:Body>
                <m:FindItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                                    xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                  <m:ResponseMessages>
                    <m:FindItemResponseMessage ResponseClass="Success">
                      <m:ResponseCode>NoError</m:ResponseCode>
                      <m:RootFolder IndexedPagingOffset="2" TotalItemsInView="3" IncludesLastItemInRange="false">
                        <t:Items>
                          <t:Message><t:ItemId Id="AAMkAA==" ChangeKey="CQAAAA=="/></t:Message>
                          <t:Message><t:ItemId Id="AAMkAB==" ChangeKey="CQAAAB=="/></t:Message>
                        </t:Items>
                      </m:RootFolder>
                    </m:FindItemResponseMessage>
                  </m:ResponseMessages>
                </m:FindItemResponse>
              </s:Body>
            </s:Envelope>"#;

        let envelope: Envelope<FindItemResponse> =
            Envelope::from_xml_document(xml.as_bytes()).expect("deserialization should succeed");

        let messages = envelope.body.response_messages.find_item_response_message;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].response_class, ResponseClass::Success);

        let root_folder = messages[0]
            .root_folder
            .as_ref()
            .expect("root folder should be present on success");
        assert_eq!(
            root_folder.indexed_paging_offset,
            Some(2),
            "paging offset should match original document"
        );
        assert_eq!(root_folder.total_items_in_view, 3);
        assert!(
            !root_folder.includes_last_item_in_range,
            "listing should report more results remaining"
        );

        assert_eq!(root_folder.items.inner.len(), 2);
        assert_eq!(root_folder.items.inner[0].kind(), Some(ItemKind::Message));
    }
}
