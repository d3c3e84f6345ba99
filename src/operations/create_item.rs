/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::{BaseFolderId, MessageDisposition};
use crate::types::items::{Item, Items};
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{write_end, write_start, XmlWrite};
use crate::Error;

/// A request to create (and optionally send) one or more items.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createitem>
#[derive(Clone, Debug)]
pub struct CreateItem {
    /// How to handle message items once created.
    ///
    /// Required when creating message items; must be absent for other item
    /// classes.
    pub message_disposition: Option<MessageDisposition>,

    pub send_meeting_invitations: Option<SendMeetingInvitations>,

    /// The folder to create the items in.
    ///
    /// When absent, items are created in the default folder for their class.
    pub saved_item_folder_id: Option<BaseFolderId>,

    pub items: Vec<Item>,
}

impl Operation for CreateItem {
    type Response = CreateItemResponse;

    const NAME: &'static str = "CreateItem";

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = Vec::new();

        if let Some(disposition) = self.message_disposition {
            attributes.push(("MessageDisposition", disposition.as_str().to_string()));
        }
        if let Some(invitations) = self.send_meeting_invitations {
            attributes.push(("SendMeetingInvitations", invitations.as_str().to_string()));
        }

        attributes
    }

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        if let Some(folder_id) = &self.saved_item_folder_id {
            write_start(writer, "m:SavedItemFolderId")?;
            folder_id.write_xml(writer)?;
            write_end(writer, "m:SavedItemFolderId")?;
        }

        write_start(writer, "m:Items")?;
        for item in &self.items {
            item.write_xml(writer)?;
        }
        write_end(writer, "m:Items")
    }
}

/// Whether and to whom invitations are sent when creating calendar items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendMeetingInvitations {
    SendToNone,
    SendOnlyToAll,
    SendToAllAndSaveCopy,
}

impl SendMeetingInvitations {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendMeetingInvitations::SendToNone => "SendToNone",
            SendMeetingInvitations::SendOnlyToAll => "SendOnlyToAll",
            SendMeetingInvitations::SendToAllAndSaveCopy => "SendToAllAndSaveCopy",
        }
    }
}

/// A response to a [`CreateItem`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateItemResponse {
    pub response_messages: CreateItemResponseMessages,
}

impl OperationResponse for CreateItemResponse {
    type Message = CreateItemResponseMessage;

    const NAME: &'static str = "CreateItemResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.create_item_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.create_item_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateItemResponseMessages {
    #[serde(default)]
    pub create_item_response_message: Vec<CreateItemResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateItemResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub items: Option<Items>,
}

impl_response_message!(CreateItemResponseMessage);
