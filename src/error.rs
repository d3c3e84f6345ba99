/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Error values for EWS operations.

use thiserror::Error;

use crate::types::items::ItemKind;
use crate::types::response::ResponseError;
use crate::types::soap::Fault;

/// Error types for EWS operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("an error occurred during HTTP transport")]
    Http(#[from] reqwest::Error),

    #[error("an error occurred while writing a request document")]
    Io(#[from] std::io::Error),

    #[error("the server rejected the request credentials")]
    Authentication,

    #[error("error manipulating XML data")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to deserialize response from XML")]
    Deserialize(#[from] serde_path_to_error::Error<quick_xml::DeError>),

    #[error("request resulted in a SOAP fault")]
    RequestFault(Box<Fault>),

    #[error("request resulted in an error: {0}")]
    ResponseError(#[from] ResponseError),

    #[error("missing item or folder ID in response from Exchange")]
    MissingIdInResponse,

    #[error(
        "response contained an unexpected number of response messages: expected {expected}, got {actual}"
    )]
    UnexpectedResponseMessageCount { expected: usize, actual: usize },

    #[error("no detail fetch factory is registered for item kind {0:?}")]
    MissingFetchFactory(ItemKind),

    #[error("local store error: {0}")]
    Store(String),

    #[error("error in processing response: {message}")]
    Processing { message: String },
}
