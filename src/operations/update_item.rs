/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::{BaseItemId, MessageDisposition};
use crate::types::items::{ItemKind, Items};
use crate::types::properties::{ExtendedProperty, PropertyPath, PropertyValue};
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{write_end, write_start, write_text_element, XmlWrite};
use crate::Error;

/// A request to update properties of one or more items.
///
/// Field updates within an item change are applied in the order given.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updateitem>
#[derive(Clone, Debug)]
pub struct UpdateItem {
    pub conflict_resolution: ConflictResolution,

    /// How to handle message items once updated.
    ///
    /// Required when updating message items; must be absent for other item
    /// classes.
    pub message_disposition: Option<MessageDisposition>,

    pub send_meeting_invitations_or_cancellations:
        Option<SendMeetingInvitationsOrCancellations>,

    pub item_changes: Vec<ItemChange>,
}

impl Operation for UpdateItem {
    type Response = UpdateItemResponse;

    const NAME: &'static str = "UpdateItem";

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![(
            "ConflictResolution",
            self.conflict_resolution.as_str().to_string(),
        )];

        if let Some(disposition) = self.message_disposition {
            attributes.push(("MessageDisposition", disposition.as_str().to_string()));
        }
        if let Some(value) = self.send_meeting_invitations_or_cancellations {
            attributes.push((
                "SendMeetingInvitationsOrCancellations",
                value.as_str().to_string(),
            ));
        }

        attributes
    }

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_start(writer, "m:ItemChanges")?;
        for change in &self.item_changes {
            change.write_xml(writer)?;
        }
        write_end(writer, "m:ItemChanges")
    }
}

/// How the server should proceed when an item's change key is no longer
/// current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictResolution {
    NeverOverwrite,
    #[default]
    AutoResolve,
    AlwaysOverwrite,
}

impl ConflictResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictResolution::NeverOverwrite => "NeverOverwrite",
            ConflictResolution::AutoResolve => "AutoResolve",
            ConflictResolution::AlwaysOverwrite => "AlwaysOverwrite",
        }
    }
}

/// Whether and to whom updates are sent when changing calendar items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendMeetingInvitationsOrCancellations {
    SendToNone,
    SendOnlyToAll,
    SendOnlyToChanged,
    SendToAllAndSaveCopy,
    SendToChangedAndSaveCopy,
}

impl SendMeetingInvitationsOrCancellations {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendMeetingInvitationsOrCancellations::SendToNone => "SendToNone",
            SendMeetingInvitationsOrCancellations::SendOnlyToAll => "SendOnlyToAll",
            SendMeetingInvitationsOrCancellations::SendOnlyToChanged => "SendOnlyToChanged",
            SendMeetingInvitationsOrCancellations::SendToAllAndSaveCopy => {
                "SendToAllAndSaveCopy"
            }
            SendMeetingInvitationsOrCancellations::SendToChangedAndSaveCopy => {
                "SendToChangedAndSaveCopy"
            }
        }
    }
}

/// The set of field updates to apply to a single item.
#[derive(Clone, Debug)]
pub struct ItemChange {
    pub item_id: BaseItemId,

    /// The class of the item being changed, which determines the element
    /// wrapping new field values.
    pub item_kind: ItemKind,

    pub updates: Vec<ItemChangeDescription>,
}

impl XmlWrite for ItemChange {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_start(writer, "t:ItemChange")?;
        self.item_id.write_xml(writer)?;

        write_start(writer, "t:Updates")?;
        for update in &self.updates {
            update.write_update_xml(writer, self.item_kind)?;
        }
        write_end(writer, "t:Updates")?;

        write_end(writer, "t:ItemChange")
    }
}

/// A single ordered field update.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updates-item>
#[derive(Clone, Debug)]
pub enum ItemChangeDescription {
    /// Appends a value to an append-capable property.
    AppendToItemField {
        path: PropertyPath,
        value: PropertyValue,
    },

    /// Sets or overwrites a property.
    SetItemField {
        path: PropertyPath,
        value: PropertyValue,
    },

    /// Removes a property from the item.
    DeleteItemField { path: PropertyPath },
}

impl ItemChangeDescription {
    fn write_update_xml<W: Write>(
        &self,
        writer: &mut Writer<W>,
        item_kind: ItemKind,
    ) -> Result<(), Error> {
        match self {
            ItemChangeDescription::AppendToItemField { path, value } => {
                write_start(writer, "t:AppendToItemField")?;
                path.write_xml(writer)?;
                write_field_value(writer, item_kind, path, value)?;
                write_end(writer, "t:AppendToItemField")
            }

            ItemChangeDescription::SetItemField { path, value } => {
                write_start(writer, "t:SetItemField")?;
                path.write_xml(writer)?;
                write_field_value(writer, item_kind, path, value)?;
                write_end(writer, "t:SetItemField")
            }

            ItemChangeDescription::DeleteItemField { path } => {
                write_start(writer, "t:DeleteItemField")?;
                path.write_xml(writer)?;
                write_end(writer, "t:DeleteItemField")
            }
        }
    }
}

/// Writes the new value of a field, wrapped in an item element of the
/// appropriate class as the schema requires.
fn write_field_value<W: Write>(
    writer: &mut Writer<W>,
    item_kind: ItemKind,
    path: &PropertyPath,
    value: &PropertyValue,
) -> Result<(), Error> {
    let wrapper = format!("t:{}", item_kind.wire_name());
    write_start(writer, &wrapper)?;

    match path {
        PropertyPath::ExtendedFieldUri(uri) => {
            let property = ExtendedProperty {
                extended_field_uri: uri.clone(),
                value: Some(value.to_text()?),
            };
            property.write_xml(writer)?;
        }

        _ => {
            let field_name = path.field_element_name().ok_or_else(|| Error::Processing {
                message: "field URI has no element name".to_string(),
            })?;
            write_text_element(writer, &format!("t:{field_name}"), &value.to_text()?)?;
        }
    }

    write_end(writer, &wrapper)
}

/// A response to an [`UpdateItem`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemResponse {
    pub response_messages: UpdateItemResponseMessages,
}

impl OperationResponse for UpdateItemResponse {
    type Message = UpdateItemResponseMessage;

    const NAME: &'static str = "UpdateItemResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.update_item_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.update_item_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemResponseMessages {
    #[serde(default)]
    pub update_item_response_message: Vec<UpdateItemResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub items: Option<Items>,
}

impl_response_message!(UpdateItemResponseMessage);

#[cfg(test)]
mod tests {
    use crate::test_utils::serialize_operation;
    use crate::types::soap::Envelope;

    use super::*;

    #[test]
    fn serialize_update_item_with_ordered_field_updates() {
        let op = UpdateItem {
            conflict_resolution: ConflictResolution::AutoResolve,
            message_disposition: Some(MessageDisposition::SaveOnly),
            send_meeting_invitations_or_cancellations: None,
            item_changes: vec![ItemChange {
                item_id: BaseItemId::ItemId {
                    id: "AAMkAA==".to_string(),
                    change_key: Some("CQAAAA==".to_string()),
                },
                item_kind: ItemKind::Message,
                updates: vec![
                    ItemChangeDescription::SetItemField {
                        path: PropertyPath::field_uri("message:IsRead"),
                        value: PropertyValue::Boolean(true),
                    },
                    ItemChangeDescription::DeleteItemField {
                        path: PropertyPath::field_uri("item:ReminderDueBy"),
                    },
                ],
            }],
        };

        let expected = concat!(
            r#"<m:UpdateItem ConflictResolution="AutoResolve" MessageDisposition="SaveOnly">"#,
            "<m:ItemChanges><t:ItemChange>",
            r#"<t:ItemId Id="AAMkAA==" ChangeKey="CQAAAA=="/>"#,
            "<t:Updates>",
            "<t:SetItemField>",
            r#"<t:FieldURI FieldURI="message:IsRead"/>"#,
            "<t:Message><t:IsRead>true</t:IsRead></t:Message>",
            "</t:SetItemField>",
            "<t:DeleteItemField>",
            r#"<t:FieldURI FieldURI="item:ReminderDueBy"/>"#,
            "</t:DeleteItemField>",
            "</t:Updates>",
            "</t:ItemChange></m:ItemChanges>",
            "</m:UpdateItem>",
        );

        assert_eq!(serialize_operation(&op), expected);
    }

    #[test]
    fn deserialize_update_item_response_with_conflict_error() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
              <s:Body>
                <m:UpdateItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                                      xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                  <m:ResponseMessages>
                    <m:UpdateItemResponseMessage ResponseClass="Error">
                      <m:MessageText>The change key is stale.</m:MessageText>
                      <m:ResponseCode>ErrorIrresolvableConflict</m:ResponseCode>
                    </m:UpdateItemResponseMessage>
                  </m:ResponseMessages>
                </m:UpdateItemResponse>
              </s:Body>
            </s:Envelope>"#;

        let envelope: Envelope<UpdateItemResponse> =
            Envelope::from_xml_document(xml.as_bytes()).expect("deserialization should succeed");

        let messages = envelope.body.into_messages();
        assert_eq!(messages[0].response_class, ResponseClass::Error);
        assert_eq!(
            messages[0].response_code.as_deref(),
            Some("ErrorIrresolvableConflict")
        );
    }
}
