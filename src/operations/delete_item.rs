/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::BaseItemId;
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{bool_text, write_end, write_start, XmlWrite};
use crate::Error;

/// A request to delete one or more items.
///
/// The response contains one message per requested identifier, in request
/// order.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deleteitem>
#[derive(Clone, Debug)]
pub struct DeleteItem {
    pub delete_type: DeleteType,

    pub send_meeting_cancellations: Option<SendMeetingCancellations>,

    pub affected_task_occurrences: Option<AffectedTaskOccurrences>,

    pub suppress_read_receipts: Option<bool>,

    pub item_ids: Vec<BaseItemId>,
}

impl Operation for DeleteItem {
    type Response = DeleteItemResponse;

    const NAME: &'static str = "DeleteItem";

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![("DeleteType", self.delete_type.as_str().to_string())];

        if let Some(value) = self.send_meeting_cancellations {
            attributes.push(("SendMeetingCancellations", value.as_str().to_string()));
        }
        if let Some(value) = self.affected_task_occurrences {
            attributes.push(("AffectedTaskOccurrences", value.as_str().to_string()));
        }
        if let Some(value) = self.suppress_read_receipts {
            attributes.push(("SuppressReadReceipts", bool_text(value).to_string()));
        }

        attributes
    }

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_start(writer, "m:ItemIds")?;
        for item_id in &self.item_ids {
            item_id.write_xml(writer)?;
        }
        write_end(writer, "m:ItemIds")
    }
}

/// The manner in which items are deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteType {
    HardDelete,
    SoftDelete,
    MoveToDeletedItems,
}

impl DeleteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteType::HardDelete => "HardDelete",
            DeleteType::SoftDelete => "SoftDelete",
            DeleteType::MoveToDeletedItems => "MoveToDeletedItems",
        }
    }
}

/// Whether and to whom cancellations are sent when deleting calendar items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendMeetingCancellations {
    SendToNone,
    SendOnlyToAll,
    SendToAllAndSaveCopy,
}

impl SendMeetingCancellations {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendMeetingCancellations::SendToNone => "SendToNone",
            SendMeetingCancellations::SendOnlyToAll => "SendOnlyToAll",
            SendMeetingCancellations::SendToAllAndSaveCopy => "SendToAllAndSaveCopy",
        }
    }
}

/// Which occurrences of a recurring task are affected by a deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AffectedTaskOccurrences {
    AllOccurrences,
    SpecifiedOccurrenceOnly,
}

impl AffectedTaskOccurrences {
    pub fn as_str(&self) -> &'static str {
        match self {
            AffectedTaskOccurrences::AllOccurrences => "AllOccurrences",
            AffectedTaskOccurrences::SpecifiedOccurrenceOnly => "SpecifiedOccurrenceOnly",
        }
    }
}

/// A response to a [`DeleteItem`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemResponse {
    pub response_messages: DeleteItemResponseMessages,
}

impl OperationResponse for DeleteItemResponse {
    type Message = DeleteItemResponseMessage;

    const NAME: &'static str = "DeleteItemResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.delete_item_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.delete_item_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemResponseMessages {
    #[serde(default)]
    pub delete_item_response_message: Vec<DeleteItemResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,
}

impl_response_message!(DeleteItemResponseMessage);
