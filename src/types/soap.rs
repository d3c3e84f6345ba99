/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! SOAP envelope (de)serialization.

use std::marker::PhantomData;

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Writer;
use serde::de::{IgnoredAny, Visitor};
use serde::{Deserialize, Deserializer};

use crate::operations::{Operation, OperationResponse};
use crate::types::common::{ExchangeServerVersion, MESSAGES_NS_URI, SOAP_NS_URI, TYPES_NS_URI};
use crate::types::response::MessageXml;
use crate::xml::{write_empty_element, write_end, write_start};
use crate::Error;

/// A SOAP envelope wrapping the body of an EWS operation or response.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383494>
#[derive(Clone, Debug)]
pub struct Envelope<B> {
    pub body: B,
}

impl<B> Envelope<B>
where
    B: Operation,
{
    /// Serializes the SOAP envelope as a complete XML document.
    pub fn as_xml_document(&self) -> Result<Vec<u8>, Error> {
        const SOAP_ENVELOPE: &str = "soap:Envelope";
        const SOAP_HEADER: &str = "soap:Header";
        const SOAP_BODY: &str = "soap:Body";

        let mut writer = Writer::new(Vec::new());

        // All EWS examples use XML 1.0 with UTF-8, so stick to that.
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        writer.write_event(Event::Start(BytesStart::new(SOAP_ENVELOPE).with_attributes([
            ("xmlns:soap", SOAP_NS_URI),
            ("xmlns:m", MESSAGES_NS_URI),
            ("xmlns:t", TYPES_NS_URI),
        ])))?;

        write_start(&mut writer, SOAP_HEADER)?;
        write_empty_element(
            &mut writer,
            "t:RequestServerVersion",
            &[("Version", ExchangeServerVersion::default().as_str())],
        )?;
        write_end(&mut writer, SOAP_HEADER)?;

        write_start(&mut writer, SOAP_BODY)?;

        // The body contains exactly one element, named for the operation.
        let name = format!("m:{}", B::NAME);
        let attributes = self.body.attributes();
        let mut start = BytesStart::new(name.as_str());
        for (attr_name, attr_value) in &attributes {
            start.push_attribute((*attr_name, attr_value.as_str()));
        }
        writer.write_event(Event::Start(start))?;
        self.body.write_children(&mut writer)?;
        write_end(&mut writer, &name)?;

        write_end(&mut writer, SOAP_BODY)?;
        write_end(&mut writer, SOAP_ENVELOPE)?;

        Ok(writer.into_inner())
    }
}

impl<B> Envelope<B>
where
    B: OperationResponse,
{
    /// Populates an [`Envelope`] from raw XML.
    ///
    /// A body containing a SOAP fault yields [`Error::RequestFault`]; a body
    /// whose element does not match the expected response name is a hard
    /// failure.
    pub fn from_xml_document(document: &[u8]) -> Result<Self, Error> {
        let de = &mut quick_xml::de::Deserializer::from_reader(document);

        // `serde_path_to_error` gives us a description of the context within
        // the structure when deserialization fails, where serde's default
        // errors only provide the immediate error.
        let envelope: DeserializeEnvelope<B> = serde_path_to_error::deserialize(de)?;

        match envelope.body {
            EnvelopeContent::Body(body) => Ok(Envelope { body }),
            EnvelopeContent::Fault(fault) => Err(Error::RequestFault(Box::new(fault))),
        }
    }
}

/// A structured representation of a SOAP fault, indicating an error in an EWS
/// request.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383507>
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Fault {
    /// An error code indicating the fault in the original request.
    pub faultcode: String,

    /// A human-readable description of the error.
    pub faultstring: String,

    /// A URI indicating the SOAP actor responsible for the error.
    pub faultactor: Option<String>,

    /// Clarifying information about EWS-specific errors.
    pub detail: Option<FaultDetail>,
}

impl Fault {
    /// The back off delay requested by a throttling server, if any.
    pub fn back_off_milliseconds(&self) -> Option<u64> {
        self.detail
            .as_ref()?
            .message_xml
            .as_ref()
            .and_then(MessageXml::back_off_milliseconds)
    }
}

/// EWS-specific details regarding a SOAP fault.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FaultDetail {
    /// An error code indicating the nature of the issue.
    pub response_code: Option<String>,

    /// A human-readable description of the error.
    pub message: Option<String>,

    /// Error-specific information to aid in understanding or responding to the
    /// error.
    pub message_xml: Option<MessageXml>,
}

/// A helper for deserialization of SOAP envelopes.
///
/// This struct is declared separately from the more general [`Envelope`] type
/// so that the latter can be used with types that are write-only.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeserializeEnvelope<T>
where
    T: OperationResponse,
{
    #[serde(deserialize_with = "deserialize_body")]
    body: EnvelopeContent<T>,
}

enum EnvelopeContent<T> {
    Body(T),
    Fault(Fault),
}

fn deserialize_body<'de, D, T>(body: D) -> Result<EnvelopeContent<T>, D::Error>
where
    D: Deserializer<'de>,
    T: OperationResponse,
{
    body.deserialize_map(BodyVisitor::<T>(PhantomData))
}

/// A visitor for name-checked deserialization of operation responses.
struct BodyVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for BodyVisitor<T>
where
    T: OperationResponse,
{
    type Value = EnvelopeContent<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("EWS operation response body")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut content: Option<EnvelopeContent<T>> = None;

        while let Some(name) = map.next_key::<String>()? {
            // Serde considers XML attributes on the body element to be
            // entries of the same map as its children; skip them.
            if name.starts_with('@') {
                map.next_value::<IgnoredAny>()?;
                continue;
            }

            if content.is_some() {
                // The response body contained more than one element, which
                // violates our expectations.
                return Err(serde::de::Error::custom(format_args!(
                    "unexpected element `{name}`"
                )));
            }

            if name == "Fault" {
                content = Some(EnvelopeContent::Fault(map.next_value()?));
            } else if name == T::NAME {
                content = Some(EnvelopeContent::Body(map.next_value()?));
            } else {
                return Err(serde::de::Error::custom(format_args!(
                    "unknown element `{}`, expected {}",
                    name,
                    T::NAME
                )));
            }
        }

        content.ok_or_else(|| serde::de::Error::custom("response body contained no elements"))
    }
}
