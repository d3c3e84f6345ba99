/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::{BaseFolderId, BaseItemId, ItemId};
use crate::types::items::Items;
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{bool_text, write_end, write_start, write_text_element, XmlWrite};
use crate::Error;

/// A request to move one or more items into a different folder.
///
/// Moving an item gives it a new change key; when `return_new_item_ids` is
/// set, each response message carries the item's post-move identifier.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/moveitem>
#[derive(Clone, Debug)]
pub struct MoveItem {
    pub to_folder_id: BaseFolderId,

    pub item_ids: Vec<BaseItemId>,

    pub return_new_item_ids: Option<bool>,
}

impl Operation for MoveItem {
    type Response = MoveItemResponse;

    const NAME: &'static str = "MoveItem";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_start(writer, "m:ToFolderId")?;
        self.to_folder_id.write_xml(writer)?;
        write_end(writer, "m:ToFolderId")?;

        write_start(writer, "m:ItemIds")?;
        for item_id in &self.item_ids {
            item_id.write_xml(writer)?;
        }
        write_end(writer, "m:ItemIds")?;

        if let Some(return_new_item_ids) = self.return_new_item_ids {
            write_text_element(writer, "m:ReturnNewItemIds", bool_text(return_new_item_ids))?;
        }

        Ok(())
    }
}

/// A response to a [`MoveItem`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MoveItemResponse {
    pub response_messages: MoveItemResponseMessages,
}

impl OperationResponse for MoveItemResponse {
    type Message = MoveItemResponseMessage;

    const NAME: &'static str = "MoveItemResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.move_item_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.move_item_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MoveItemResponseMessages {
    #[serde(default)]
    pub move_item_response_message: Vec<MoveItemResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MoveItemResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub items: Option<Items>,
}

impl_response_message!(MoveItemResponseMessage);

impl MoveItemResponseMessage {
    /// The moved item's new identifier, if the server returned one.
    pub fn new_item_id(&self) -> Option<&ItemId> {
        self.items
            .as_ref()?
            .inner
            .first()
            .and_then(|item| item.inner())
            .and_then(|data| data.item_id.as_ref())
    }
}
