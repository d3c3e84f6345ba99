/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Typed EWS operations.
//!
//! Each operation module declares a request structure, the corresponding
//! response structures and the wiring between the two. Requests know how to
//! write their own body XML; responses deserialize via serde.

use std::io::Write;

use quick_xml::Writer;
use serde::de::DeserializeOwned;

use crate::types::response::ResponseMessage;
use crate::Error;

pub mod create_folder;
pub mod create_item;
pub mod delete_item;
pub mod find_item;
pub mod get_events;
pub mod get_folder;
pub mod get_item;
pub mod get_streaming_events;
pub mod move_item;
pub mod subscribe;
pub mod update_item;

pub use create_folder::*;
pub use create_item::*;
pub use delete_item::*;
pub use find_item::*;
pub use get_events::*;
pub use get_folder::*;
pub use get_item::*;
pub use get_streaming_events::*;
pub use move_item::*;
pub use subscribe::*;
pub use update_item::*;

/// An EWS operation which can be sent as the body of a request.
pub trait Operation {
    /// The structure of the expected response.
    type Response: OperationResponse;

    /// The name of the operation's body element.
    const NAME: &'static str;

    /// Attributes to set on the operation's body element.
    fn attributes(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Writes the children of the operation's body element in schema order.
    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error>;
}

/// The structure of a response to an EWS operation.
pub trait OperationResponse: DeserializeOwned {
    /// The per-identifier message type within the response.
    type Message: ResponseMessage;

    /// The name of the response's body element.
    const NAME: &'static str;

    /// The response's messages in server order.
    fn messages(&self) -> &[Self::Message];

    /// Consumes the response, returning its messages in server order.
    fn into_messages(self) -> Vec<Self::Message>;
}

/// Verifies that a response contains the expected number of messages.
///
/// Batch operations return one message per submitted identifier, in
/// submission order; any other count indicates a malformed response.
pub(crate) fn validate_response_message_count<M>(
    messages: &[M],
    expected: usize,
) -> Result<(), Error> {
    if messages.len() == expected {
        Ok(())
    } else {
        Err(Error::UnexpectedResponseMessageCount {
            expected,
            actual: messages.len(),
        })
    }
}

/// Extracts the sole message of a single-identifier response, escalating an
/// error-class message into an [`Error`].
pub(crate) fn single_response_or_error<R: OperationResponse>(
    response: R,
) -> Result<R::Message, Error> {
    let messages = response.into_messages();
    validate_response_message_count(&messages, 1)?;

    let message = messages.into_iter().next().ok_or(Error::Processing {
        message: "response contained no response message".to_string(),
    })?;

    Ok(message.into_result()?)
}
