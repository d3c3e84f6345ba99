/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::{BaseItemId, ItemShape};
use crate::types::items::Items;
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{write_end, write_start, XmlWrite};
use crate::Error;

/// A request to fetch the details of one or more items.
///
/// The response contains one message per requested identifier, in request
/// order.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getitem>
#[derive(Clone, Debug)]
pub struct GetItem {
    pub item_shape: ItemShape,

    pub item_ids: Vec<BaseItemId>,
}

impl Operation for GetItem {
    type Response = GetItemResponse;

    const NAME: &'static str = "GetItem";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        self.item_shape.write_xml(writer)?;

        write_start(writer, "m:ItemIds")?;
        for item_id in &self.item_ids {
            item_id.write_xml(writer)?;
        }
        write_end(writer, "m:ItemIds")
    }
}

/// A response to a [`GetItem`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemResponse {
    pub response_messages: GetItemResponseMessages,
}

impl OperationResponse for GetItemResponse {
    type Message = GetItemResponseMessage;

    const NAME: &'static str = "GetItemResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.get_item_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.get_item_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemResponseMessages {
    #[serde(default)]
    pub get_item_response_message: Vec<GetItemResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub items: Option<Items>,
}

impl_response_message!(GetItemResponseMessage);
