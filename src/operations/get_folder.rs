/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::operations::{Operation, OperationResponse};
use crate::types::common::{BaseFolderId, FolderShape};
use crate::types::folders::Folders;
use crate::types::response::{impl_response_message, MessageXml, ResponseClass};
use crate::xml::{write_end, write_start, XmlWrite};
use crate::Error;

/// A request to fetch the details of one or more folders.
///
/// The response contains one message per requested identifier, in request
/// order.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getfolder>
#[derive(Clone, Debug)]
pub struct GetFolder {
    pub folder_shape: FolderShape,

    pub folder_ids: Vec<BaseFolderId>,
}

impl Operation for GetFolder {
    type Response = GetFolderResponse;

    const NAME: &'static str = "GetFolder";

    fn write_children<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        self.folder_shape.write_xml(writer)?;

        write_start(writer, "m:FolderIds")?;
        for folder_id in &self.folder_ids {
            folder_id.write_xml(writer)?;
        }
        write_end(writer, "m:FolderIds")
    }
}

/// A response to a [`GetFolder`] request.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetFolderResponse {
    pub response_messages: GetFolderResponseMessages,
}

impl OperationResponse for GetFolderResponse {
    type Message = GetFolderResponseMessage;

    const NAME: &'static str = "GetFolderResponse";

    fn messages(&self) -> &[Self::Message] {
        &self.response_messages.get_folder_response_message
    }

    fn into_messages(self) -> Vec<Self::Message> {
        self.response_messages.get_folder_response_message
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetFolderResponseMessages {
    #[serde(default)]
    pub get_folder_response_message: Vec<GetFolderResponseMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GetFolderResponseMessage {
    /// The status of the corresponding request, i.e. whether it succeeded or
    /// resulted in an error.
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,

    pub response_code: Option<String>,

    pub message_text: Option<String>,

    pub message_xml: Option<MessageXml>,

    pub folders: Option<Folders>,
}

impl_response_message!(GetFolderResponseMessage);

#[cfg(test)]
mod tests {
    use crate::test_utils::serialize_operation;
    use crate::types::common::{BaseShape, DistinguishedFolderId};
    use crate::types::soap::Envelope;

    use super::*;

    #[test]
    fn serialize_get_folder() {
        let op = GetFolder {
            folder_shape: FolderShape {
                base_shape: BaseShape::Default,
            },
            folder_ids: vec![
                BaseFolderId::DistinguishedFolderId {
                    id: DistinguishedFolderId::Inbox,
                    change_key: None,
                },
                BaseFolderId::FolderId {
                    id: "AQMkAA==".to_string(),
                    change_key: Some("AQAAAA==".to_string()),
                },
            ],
        };

        let expected = concat!(
            "<m:GetFolder>",
            "<m:FolderShape><t:BaseShape>Default</t:BaseShape></m:FolderShape>",
            "<m:FolderIds>",
            r#"<t:DistinguishedFolderId Id="inbox"/>"#,
            r#"<t:FolderId Id="AQMkAA==" ChangeKey="AQAAAA=="/>"#,
            "</m:FolderIds>",
            "</m:GetFolder>",
        );

        assert_eq!(serialize_operation(&op), expected);
    }

    #[test]
    fn deserialize_get_folder_response() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
              <s:Body>
                <m:GetFolderResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                                     xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                  <m:ResponseMessages>
                    <m:GetFolderResponseMessage ResponseClass="Success">
                      <m:ResponseCode>NoError</m:ResponseCode>
                      <m:Folders>
                        <t:Folder>
                          <t:FolderId Id="AQMkAA==" ChangeKey="AQAAAA=="/>
                          <t:DisplayName>Inbox</t:DisplayName>
                          <t:UnreadCount>4</t:UnreadCount>
                        </t:Folder>
                      </m:Folders>
                    </m:GetFolderResponseMessage>
                  </m:ResponseMessages>
                </m:GetFolderResponse>
              </s:Body>
            </s:Envelope>"#;

        let envelope: Envelope<GetFolderResponse> =
            Envelope::from_xml_document(xml.as_bytes()).expect("deserialization should succeed");

        let messages = envelope.body.into_messages();
        assert_eq!(messages.len(), 1);

        let folders = messages[0].folders.as_ref().expect("folders should be present");
        let folder = folders.inner[0].inner();
        assert_eq!(folder.display_name.as_deref(), Some("Inbox"));
        assert_eq!(folder.unread_count, Some(4));
    }
}
