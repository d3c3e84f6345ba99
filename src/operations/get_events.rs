/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::events::Notification;
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::write_text_element;
use crate::Error;

/// A request for the events which have occurred on a pull subscription since
/// the given watermark.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getevents-operation>
#[derive(Clone, Debug)]
pub struct GetEvents {
    pub subscription_id: String,

    /// The watermark of the last event already seen, or the watermark returned
    /// when the subscription was created if none has been seen yet.
    pub watermark: String,
}

impl Operation for GetEvents {
    type Response = GetEventsResponse;

    const NAME: &'static str = "GetEvents";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_text_element(writer, "m:SubscriptionId", &self.subscription_id)?;
        write_text_element(writer, "m:Watermark", &self.watermark)
    }
}

/// A response to a [`GetEvents`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetEventsResponse {
    pub response_messages: GetEventsResponseMessages,
}

impl OperationResponse for GetEventsResponse {
    type Message = GetEventsResponseMessage;

    const NAME: &'static str = "GetEventsResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.get_events_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.get_events_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetEventsResponseMessages {
    #[serde(default)]
    pub get_events_response_message: Vec<GetEventsResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetEventsResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub notification: Option<Notification>,
}

impl_response_message!(GetEventsResponseMessage);
