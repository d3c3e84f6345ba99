/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Folder data structures.

use std::io::Write;

use quick_xml::Writer;
use serde::Deserialize;

use crate::types::common::FolderId;
use crate::types::properties::ExtendedProperty;
use crate::xml::{write_end, write_start, write_text_element, XmlWrite};
use crate::Error;

/// The properties of a folder, shared between all folder classes.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FolderData {
    pub folder_id: Option<FolderId>,

    pub parent_folder_id: Option<FolderId>,

    /// The MAPI class of the folder, e.g. `IPF.Note`.
    pub folder_class: Option<String>,

    pub display_name: Option<String>,

    pub total_count: Option<u32>,

    pub child_folder_count: Option<u32>,

    pub unread_count: Option<u32>,

    #[serde(rename = "ExtendedProperty", default)]
    pub extended_property: Vec<ExtendedProperty>,
}

/// A folder, tagged with its class-specific element name.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folder>
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub enum Folder {
    CalendarFolder(FolderData),
    ContactsFolder(FolderData),
    Folder(FolderData),
    SearchFolder(FolderData),
    TasksFolder(FolderData),
}

impl Folder {
    pub fn inner(&self) -> &FolderData {
        match self {
            Folder::CalendarFolder(data)
            | Folder::ContactsFolder(data)
            | Folder::Folder(data)
            | Folder::SearchFolder(data)
            | Folder::TasksFolder(data) => data,
        }
    }

    pub fn into_inner(self) -> FolderData {
        match self {
            Folder::CalendarFolder(data)
            | Folder::ContactsFolder(data)
            | Folder::Folder(data)
            | Folder::SearchFolder(data)
            | Folder::TasksFolder(data) => data,
        }
    }

    fn element_name(&self) -> &'static str {
        match self {
            Folder::CalendarFolder(_) => "t:CalendarFolder",
            Folder::ContactsFolder(_) => "t:ContactsFolder",
            Folder::Folder(_) => "t:Folder",
            Folder::SearchFolder(_) => "t:SearchFolder",
            Folder::TasksFolder(_) => "t:TasksFolder",
        }
    }
}

impl XmlWrite for Folder {
    // Only the writable creation-time properties are emitted; identifiers and
    // counts are assigned by the server.
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        let name = self.element_name();
        let data = self.inner();

        write_start(writer, name)?;
        if let Some(folder_class) = &data.folder_class {
            write_text_element(writer, "t:FolderClass", folder_class)?;
        }
        if let Some(display_name) = &data.display_name {
            write_text_element(writer, "t:DisplayName", display_name)?;
        }
        for property in &data.extended_property {
            property.write_xml(writer)?;
        }
        write_end(writer, name)
    }
}

/// A list of folders within a response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Folders {
    #[serde(rename = "$value", default)]
    pub inner: Vec<Folder>,
}
