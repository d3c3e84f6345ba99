/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::BaseFolderId;
use crate::types::folders::{Folder, Folders};
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{write_end, write_start, XmlWrite};
use crate::Error;

/// A request to create one or more folders.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createfolder>
#[derive(Clone, Debug)]
pub struct CreateFolder {
    pub parent_folder_id: BaseFolderId,

    pub folders: Vec<Folder>,
}

impl Operation for CreateFolder {
    type Response = CreateFolderResponse;

    const NAME: &'static str = "CreateFolder";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        write_start(writer, "m:ParentFolderId")?;
        self.parent_folder_id.write_xml(writer)?;
        write_end(writer, "m:ParentFolderId")?;

        write_start(writer, "m:Folders")?;
        for folder in &self.folders {
            folder.write_xml(writer)?;
        }
        write_end(writer, "m:Folders")
    }
}

/// A response to a [`CreateFolder`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateFolderResponse {
    pub response_messages: CreateFolderResponseMessages,
}

impl OperationResponse for CreateFolderResponse {
    type Message = CreateFolderResponseMessage;

    const NAME: &'static str = "CreateFolderResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.create_folder_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.create_folder_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateFolderResponseMessages {
    #[serde(default)]
    pub create_folder_response_message: Vec<CreateFolderResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateFolderResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub folders: Option<Folders>,
}

impl_response_message!(CreateFolderResponseMessage);
