/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::BaseFolderId;
use crate::types::events::EventType;
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{write_end, write_start, write_start_with_attributes, write_text_element, XmlWrite};
use crate::Error;

/// A request to open a change-notification subscription.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/subscribe>
#[derive(Clone, Debug)]
pub struct Subscribe {
    pub request: SubscriptionRequest,
}

impl Operation for Subscribe {
    type Response = SubscribeResponse;

    const NAME: &'static str = "Subscribe";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        self.request.write_xml(writer)
    }
}

/// The delivery mechanism and scope of a subscription.
///
/// A subscription uses exactly one of the three delivery mechanisms.
#[derive(Clone, Debug)]
pub enum SubscriptionRequest {
    /// Events are held by the server and fetched by polling with
    /// [`GetEvents`].
    ///
    /// [`GetEvents`]: crate::operations::GetEvents
    Pull {
        folder_ids: Vec<BaseFolderId>,
        event_types: Vec<EventType>,

        /// A watermark from an earlier subscription to resume from.
        watermark: Option<String>,

        /// Minutes of inactivity after which the server discards the
        /// subscription.
        timeout: u32,
    },

    /// Events are posted by the server to a callback URL.
    Push {
        folder_ids: Vec<BaseFolderId>,
        event_types: Vec<EventType>,

        /// Minutes between server status checks of the callback endpoint.
        status_frequency: u32,

        url: String,
    },

    /// Events are delivered over a held-open [`GetStreamingEvents`] response.
    ///
    /// [`GetStreamingEvents`]: crate::operations::GetStreamingEvents
    Streaming {
        folder_ids: Vec<BaseFolderId>,
        event_types: Vec<EventType>,
        subscribe_to_all_folders: bool,
    },
}

fn write_folder_ids_and_event_types<W: Write>(
    writer: &mut Writer<W>,
    folder_ids: &[BaseFolderId],
    event_types: &[EventType],
) -> Result<(), Error> {
    if !folder_ids.is_empty() {
        write_start(writer, "t:FolderIds")?;
        for folder_id in folder_ids {
            folder_id.write_xml(writer)?;
        }
        write_end(writer, "t:FolderIds")?;
    }

    write_start(writer, "t:EventTypes")?;
    for event_type in event_types {
        write_text_element(writer, "t:EventType", event_type.as_str())?;
    }
    write_end(writer, "t:EventTypes")
}

impl XmlWrite for SubscriptionRequest {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        match self {
            SubscriptionRequest::Pull {
                folder_ids,
                event_types,
                watermark,
                timeout,
            } => {
                write_start(writer, "m:PullSubscriptionRequest")?;
                write_folder_ids_and_event_types(writer, folder_ids, event_types)?;
                if let Some(watermark) = watermark {
                    write_text_element(writer, "t:Watermark", watermark)?;
                }
                write_text_element(writer, "t:Timeout", &timeout.to_string())?;
                write_end(writer, "m:PullSubscriptionRequest")
            }

            SubscriptionRequest::Push {
                folder_ids,
                event_types,
                status_frequency,
                url,
            } => {
                write_start(writer, "m:PushSubscriptionRequest")?;
                write_folder_ids_and_event_types(writer, folder_ids, event_types)?;
                write_text_element(writer, "t:StatusFrequency", &status_frequency.to_string())?;
                write_text_element(writer, "t:URL", url)?;
                write_end(writer, "m:PushSubscriptionRequest")
            }

            SubscriptionRequest::Streaming {
                folder_ids,
                event_types,
                subscribe_to_all_folders,
            } => {
                if *subscribe_to_all_folders {
                    write_start_with_attributes(
                        writer,
                        "m:StreamingSubscriptionRequest",
                        &[("SubscribeToAllFolders", "true")],
                    )?;
                } else {
                    write_start(writer, "m:StreamingSubscriptionRequest")?;
                }
                write_folder_ids_and_event_types(writer, folder_ids, event_types)?;
                write_end(writer, "m:StreamingSubscriptionRequest")
            }
        }
    }
}

/// A response to a [`Subscribe`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SubscribeResponse {
    pub response_messages: SubscribeResponseMessages,
}

impl OperationResponse for SubscribeResponse {
    type Message = SubscribeResponseMessage;

    const NAME: &'static str = "SubscribeResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.subscribe_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.subscribe_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SubscribeResponseMessages {
    #[serde(default)]
    pub subscribe_response_message: Vec<SubscribeResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SubscribeResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub subscription_id: Option<String>,

    /// The initial watermark of a pull subscription.
    pub watermark: Option<String>,
}

impl_response_message!(SubscribeResponseMessage);

/// A request to end a subscription.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/unsubscribe>
#[derive(Clone, Debug)]
pub struct Unsubscribe {
    pub subscription_id: String,
}

impl Operation for Unsubscribe {
    type Response = UnsubscribeResponse;

    const NAME: &'static str = "Unsubscribe";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_text_element(writer, "m:SubscriptionId", &self.subscription_id)
    }
}

/// A response to an [`Unsubscribe`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UnsubscribeResponse {
    pub response_messages: UnsubscribeResponseMessages,
}

impl OperationResponse for UnsubscribeResponse {
    type Message = UnsubscribeResponseMessage;

    const NAME: &'static str = "UnsubscribeResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.unsubscribe_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.unsubscribe_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UnsubscribeResponseMessages {
    #[serde(default)]
    pub unsubscribe_response_message: Vec<UnsubscribeResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UnsubscribeResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,
}

impl_response_message!(UnsubscribeResponseMessage);
