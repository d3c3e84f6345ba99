/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::events::Notification;
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{write_end, write_start, write_text_element};
use crate::Error;

/// A request to open a long-lived connection over which the server pushes
/// events for one or more streaming subscriptions.
///
/// The server keeps the connection open for the given number of minutes,
/// sending a response fragment whenever events are available and empty
/// keep-alive fragments in between.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getstreamingevents-operation>
#[derive(Clone, Debug)]
pub struct GetStreamingEvents {
    pub subscription_ids: Vec<String>,

    /// The duration, in minutes, to keep the connection open for.
    ///
    /// The server accepts values between 1 and 30.
    pub connection_timeout: u32,
}

impl Operation for GetStreamingEvents {
    type Response = GetStreamingEventsResponse;

    const NAME: &'static str = "GetStreamingEvents";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_start(writer, "m:SubscriptionIds")?;
        for subscription_id in &self.subscription_ids {
            write_text_element(writer, "t:SubscriptionId", subscription_id)?;
        }
        write_end(writer, "m:SubscriptionIds")?;

        write_text_element(
            writer,
            "m:ConnectionTimeout",
            &self.connection_timeout.to_string(),
        )
    }
}

/// A response fragment from a [`GetStreamingEvents`] connection.
///
/// One complete response document arrives per fragment, not one per
/// connection.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetStreamingEventsResponse {
    pub response_messages: GetStreamingEventsResponseMessages,
}

impl OperationResponse for GetStreamingEventsResponse {
    type Message = GetStreamingEventsResponseMessage;

    const NAME: &'static str = "GetStreamingEventsResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.get_streaming_events_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.get_streaming_events_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetStreamingEventsResponseMessages {
    #[serde(default)]
    pub get_streaming_events_response_message: Vec<GetStreamingEventsResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetStreamingEventsResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub notifications: Option<Notifications>,

    /// The state of the connection, present in keep-alive fragments and in
    /// the final fragment before the server closes the connection.
    pub connection_status: Option<ConnectionStatus>,
}

impl_response_message!(GetStreamingEventsResponseMessage);

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Notifications {
    #[serde(rename = "Notification", default)]
    pub inner: Vec<Notification>,
}

/// The state of a streaming connection as reported by the server.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The connection remains open and further fragments may arrive.
    OK,

    /// The server is done with the connection and will send no further
    /// fragments.
    Closed,
}
