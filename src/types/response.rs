/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Common structures for operation responses.
//!
//! Batch operations return one response message per submitted identifier, in
//! submission order, each carrying its own success or failure status. A failed
//! message never prevents its siblings from being processed.

use serde::Deserialize;
use thiserror::Error;

/// The success/failure status of an individual response message.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsemessages>
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Warning,
    Error,
}

/// An error taken from a response message with the `Error` response class.
///
/// The response code is kept as an opaque token; the set of codes the server
/// may return is large and changes between server versions.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{}: {}", response_code.as_deref().unwrap_or("unknown error"), message_text.as_deref().unwrap_or("no message text"))]
pub struct ResponseError {
    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,
}

impl ResponseError {
    /// The back off delay requested by a throttling server, if any.
    pub fn back_off_milliseconds(&self) -> Option<u64> {
        self.message_xml
            .as_ref()
            .and_then(MessageXml::back_off_milliseconds)
    }
}

/// Error-specific structured data accompanying a response code.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/messagexml>
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MessageXml {
    #[serde(rename = "Value", default)]
    pub values: Vec<MessageXmlValue>,
}

impl MessageXml {
    /// The value of the `BackOffMilliseconds` entry sent with `ErrorServerBusy`
    /// responses, if present.
    pub fn back_off_milliseconds(&self) -> Option<u64> {
        self.values
            .iter()
            .find(|value| value.name == "BackOffMilliseconds")
            .and_then(|value| value.value.parse().ok())
    }
}

/// A named value within a [`MessageXml`] element.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MessageXmlValue {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "$text", default)]
    pub value: String,
}

/// A single message within an operation response.
///
/// Every concrete response message carries the response class/code/text
/// triple; this trait provides uniform access to it and conversion of
/// error-class messages into [`ResponseError`] values.
pub trait ResponseMessage {
    fn response_class(&self) -> ResponseClass;

    fn response_code(&self) -> Option<&str>;

    fn message_text(&self) -> Option<&str>;

    fn message_xml(&self) -> Option<&MessageXml>;

    /// Converts this message into a [`ResponseError`] if it represents a
    /// failure.
    ///
    /// Messages with the `Warning` class are treated as successful; their
    /// payload is present but may be incomplete.
    fn into_result(self) -> Result<Self, ResponseError>
    where
        Self: Sized,
    {
        match self.response_class() {
            ResponseClass::Success => Ok(self),

            ResponseClass::Warning => {
                log::warn!(
                    "response message completed with warning {}: {}",
                    self.response_code().unwrap_or("(no code)"),
                    self.message_text().unwrap_or("(no message text)")
                );

                Ok(self)
            }

            ResponseClass::Error => Err(ResponseError {
                response_code: self.response_code().map(ToOwned::to_owned),
                message_text: self.message_text().map(ToOwned::to_owned),
                message_xml: self.message_xml().cloned(),
            }),
        }
    }
}

/// Implements [`ResponseMessage`] for a response message struct declaring the
/// standard `response_class`/`response_code`/`message_text`/`message_xml`
/// fields.
macro_rules! impl_response_message {
    ($message:ty) => {
        impl $crate::types::response::ResponseMessage for $message {
            fn response_class(&self) -> $crate::types::response::ResponseClass {
                self.response_class
            }

            fn response_code(&self) -> Option<&str> {
                self.response_code.as_deref()
            }

            fn message_text(&self) -> Option<&str> {
                self.message_text.as_deref()
            }

            fn message_xml(&self) -> Option<&$crate::types::response::MessageXml> {
                self.message_xml.as_ref()
            }
        }
    };
}

pub(crate) use impl_response_message;
