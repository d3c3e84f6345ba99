/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Transport and typed request execution.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use url::Url;
use uuid::Uuid;

use crate::operations::{
    single_response_or_error, validate_response_message_count, BasePoint, CreateFolder,
    CreateItem, DeleteItem, DeleteType, FindItem, GetEvents, GetFolder, GetItem,
    GetStreamingEvents, MoveItem, Operation, OperationResponse, Paging, Subscribe,
    SubscriptionRequest, Traversal, Unsubscribe, UpdateItem,
};
use crate::types::common::{BaseFolderId, BaseItemId, BaseShape, FolderId, FolderShape, ItemId, ItemShape};
use crate::types::events::{EventType, Notification};
use crate::types::folders::Folder;
use crate::types::items::{Item, ItemRecord};
use crate::types::response::{MessageXml, ResponseError, ResponseMessage};
use crate::types::soap::Envelope;
use crate::Error;

/// Detail fetches are batched to keep individual requests small, following
/// Microsoft's throttling guidance for EWS clients.
const GET_ITEM_BATCH_SIZE: usize = 10;

const GET_FOLDER_BATCH_SIZE: usize = 10;

/// The response code with which the server signals throttling.
const ERROR_SERVER_BUSY: &str = "ErrorServerBusy";

/// When set, complete request and response payloads are written to the debug
/// log. Payloads routinely contain message subjects and addresses, so this is
/// off unless explicitly requested.
const LOG_NETWORK_PAYLOADS_VAR: &str = "EWS_LOG_NETWORK_PAYLOADS";

/// A chunked HTTP response body.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// The mechanism by which serialized requests reach the server.
///
/// Abstracting over the HTTP layer allows tests to drive the client and the
/// subscription manager with scripted responses.
pub trait Transport: Send + Sync {
    /// Sends a request body and collects the complete response body.
    fn send(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<Bytes, Error>> + Send;

    /// Sends a request body and returns the response body as a stream of
    /// chunks as the server produces them.
    fn send_streaming(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<ResponseStream, Error>> + Send;
}

impl<T> Transport for Arc<T>
where
    T: Transport,
{
    fn send(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<Bytes, Error>> + Send {
        self.as_ref().send(endpoint, body)
    }

    fn send_streaming(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<ResponseStream, Error>> + Send {
        self.as_ref().send_streaming(endpoint, body)
    }
}

/// A [`Transport`] over a reqwest HTTP client.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a transport around an existing client, e.g. one carrying
    /// authentication middleware or proxy settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        HttpTransport { client }
    }

    async fn post(&self, endpoint: &Url, body: Vec<u8>) -> Result<reqwest::Response, Error> {
        let response = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication),

            // Server errors carry a SOAP fault body, which the caller parses;
            // they are not transport failures.
            _ => Ok(response),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, endpoint: &Url, body: Vec<u8>) -> Result<Bytes, Error> {
        let response = self.post(endpoint, body).await?;

        Ok(response.bytes().await?)
    }

    async fn send_streaming(&self, endpoint: &Url, body: Vec<u8>) -> Result<ResponseStream, Error> {
        let response = self.post(endpoint, body).await?;

        Ok(Box::pin(response.bytes_stream().map_err(Error::from)))
    }
}

/// A client for a single EWS endpoint.
pub struct EwsClient<T> {
    endpoint: Url,
    transport: T,
}

/// The identifiers returned when opening a pull subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullSubscription {
    pub subscription_id: String,

    /// The watermark to pass to the first event poll.
    pub watermark: String,
}

impl<T> EwsClient<T>
where
    T: Transport,
{
    pub fn new(endpoint: Url, transport: T) -> Self {
        EwsClient { endpoint, transport }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends an operation and deserializes its response, retrying after the
    /// server-provided delay when the server reports itself busy.
    ///
    /// Throttling surfaces either as a SOAP fault or as the first message of
    /// an otherwise well-formed response, depending on the server version.
    pub async fn make_operation_request<Op>(&self, operation: Op) -> Result<Op::Response, Error>
    where
        Op: Operation,
    {
        let request_body = Envelope { body: operation }.as_xml_document()?;

        loop {
            let request_id = Uuid::new_v4();
            log::debug!("sending {} request {request_id} to {}", Op::NAME, self.endpoint);
            if log_network_payloads() {
                log::debug!("C: {}", String::from_utf8_lossy(&request_body));
            }

            let response_body = self.transport.send(&self.endpoint, request_body.clone()).await?;

            if log_network_payloads() {
                log::debug!("S: {}", String::from_utf8_lossy(&response_body));
            }

            match Envelope::<Op::Response>::from_xml_document(&response_body) {
                Ok(envelope) => {
                    if let Some(delay_ms) = server_busy_delay(&envelope.body) {
                        log::debug!(
                            "{} request {request_id} throttled, retrying in {delay_ms}ms",
                            Op::NAME
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        continue;
                    }

                    return Ok(envelope.body);
                }

                Err(Error::RequestFault(fault)) => {
                    if let Some(delay_ms) = fault.back_off_milliseconds() {
                        log::debug!(
                            "{} request {request_id} throttled, retrying in {delay_ms}ms",
                            Op::NAME
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        continue;
                    }

                    return Err(Error::RequestFault(fault));
                }

                Err(err) => return Err(err),
            }
        }
    }

    /// Lists the identifiers of every supported item in a folder, fetching
    /// pages of the given size until the server reports the end of the
    /// result set.
    ///
    /// Listings must always be paged. In particular, unpaged calendar queries
    /// collapse recurring series into a single entry, so an unpaged listing is
    /// not equivalent to a paged one even for small folders.
    pub async fn list_folder_items(
        &self,
        folder_id: BaseFolderId,
        page_size: u32,
    ) -> Result<Vec<ItemRecord>, Error> {
        let mut records = Vec::new();
        let mut offset = 0;

        loop {
            let response = self
                .make_operation_request(FindItem {
                    traversal: Traversal::Shallow,
                    item_shape: ItemShape {
                        base_shape: BaseShape::IdOnly,
                        ..Default::default()
                    },
                    paging: Some(Paging::IndexedPageItemView {
                        max_entries_returned: Some(page_size),
                        offset,
                        base_point: BasePoint::Beginning,
                    }),
                    parent_folder_ids: vec![folder_id.clone()],
                })
                .await?;

            let message = single_response_or_error(response)?;
            let root_folder = message.root_folder.ok_or(Error::Processing {
                message: "listing response message has no root folder".to_string(),
            })?;

            for item in root_folder.items.inner {
                match ItemRecord::try_from_item(item)? {
                    Some(record) => records.push(record),
                    None => log::warn!("skipping listed item of unsupported class"),
                }
            }

            if root_folder.includes_last_item_in_range {
                break;
            }

            offset = root_folder.indexed_paging_offset.ok_or(Error::Processing {
                message: "listing page is not final but has no paging offset".to_string(),
            })?;
        }

        Ok(records)
    }

    /// Fetches the details of the given items with the given shape.
    ///
    /// Any individual failure fails the whole fetch; callers wanting per-item
    /// results should fetch in smaller units.
    pub async fn get_items(
        &self,
        item_ids: &[ItemId],
        item_shape: &ItemShape,
    ) -> Result<Vec<Item>, Error> {
        let mut items = Vec::with_capacity(item_ids.len());

        for chunk in item_ids.chunks(GET_ITEM_BATCH_SIZE) {
            let response = self
                .make_operation_request(GetItem {
                    item_shape: item_shape.clone(),
                    item_ids: chunk.iter().map(BaseItemId::from).collect(),
                })
                .await?;

            let messages = response.into_messages();
            validate_response_message_count(&messages, chunk.len())?;

            for message in messages {
                let message = message.into_result()?;
                items.extend(message.items.map(|items| items.inner).unwrap_or_default());
            }
        }

        Ok(items)
    }

    /// Deletes the given items, returning one result per identifier in
    /// submission order.
    pub async fn delete_items(
        &self,
        delete_type: DeleteType,
        item_ids: &[ItemId],
    ) -> Result<Vec<Result<(), ResponseError>>, Error> {
        let response = self
            .make_operation_request(DeleteItem {
                delete_type,
                send_meeting_cancellations: None,
                affected_task_occurrences: None,
                suppress_read_receipts: None,
                item_ids: item_ids.iter().map(BaseItemId::from).collect(),
            })
            .await?;

        let messages = response.into_messages();
        validate_response_message_count(&messages, item_ids.len())?;

        Ok(messages
            .into_iter()
            .map(|message| message.into_result().map(|_| ()))
            .collect())
    }

    /// Moves the given items into a folder, returning one result per
    /// identifier in submission order. Successful results carry the item's
    /// post-move identifier when the server provides one.
    pub async fn move_items(
        &self,
        to_folder_id: BaseFolderId,
        item_ids: &[ItemId],
    ) -> Result<Vec<Result<Option<ItemId>, ResponseError>>, Error> {
        let response = self
            .make_operation_request(MoveItem {
                to_folder_id,
                item_ids: item_ids.iter().map(BaseItemId::from).collect(),
                return_new_item_ids: Some(true),
            })
            .await?;

        let messages = response.into_messages();
        validate_response_message_count(&messages, item_ids.len())?;

        Ok(messages
            .into_iter()
            .map(|message| {
                message
                    .into_result()
                    .map(|message| message.new_item_id().cloned())
            })
            .collect())
    }

    /// Fetches the details of the given folders with the given shape.
    pub async fn get_folders(
        &self,
        folder_ids: &[BaseFolderId],
        folder_shape: &FolderShape,
    ) -> Result<Vec<Folder>, Error> {
        let mut folders = Vec::with_capacity(folder_ids.len());

        for chunk in folder_ids.chunks(GET_FOLDER_BATCH_SIZE) {
            let response = self
                .make_operation_request(GetFolder {
                    folder_shape: folder_shape.clone(),
                    folder_ids: chunk.to_vec(),
                })
                .await?;

            let messages = response.into_messages();
            validate_response_message_count(&messages, chunk.len())?;

            for message in messages {
                let message = message.into_result()?;
                folders.extend(message.folders.map(|folders| folders.inner).unwrap_or_default());
            }
        }

        Ok(folders)
    }

    /// Creates a single folder, returning its new identifier.
    pub async fn create_folder(
        &self,
        parent_folder_id: BaseFolderId,
        folder: Folder,
    ) -> Result<FolderId, Error> {
        let response = self
            .make_operation_request(CreateFolder {
                parent_folder_id,
                folders: vec![folder],
            })
            .await?;

        let message = single_response_or_error(response)?;

        message
            .folders
            .and_then(|folders| folders.inner.into_iter().next())
            .and_then(|folder| folder.into_inner().folder_id)
            .ok_or(Error::MissingIdInResponse)
    }

    /// Creates a single item, returning its new identifier.
    pub async fn create_item(&self, create_item: CreateItem) -> Result<ItemId, Error> {
        let response = self.make_operation_request(create_item).await?;
        let message = single_response_or_error(response)?;

        message
            .items
            .and_then(|items| items.inner.into_iter().next())
            .and_then(|item| item.into_inner())
            .and_then(|data| data.item_id)
            .ok_or(Error::MissingIdInResponse)
    }

    /// Applies a set of item changes, returning one result per change in
    /// submission order. Successful results carry the item's new change key
    /// when the server provides one.
    pub async fn update_item(
        &self,
        update_item: UpdateItem,
    ) -> Result<Vec<Result<Option<ItemId>, ResponseError>>, Error> {
        let expected = update_item.item_changes.len();
        let response = self.make_operation_request(update_item).await?;

        let messages = response.into_messages();
        validate_response_message_count(&messages, expected)?;

        Ok(messages
            .into_iter()
            .map(|message| {
                message.into_result().map(|message| {
                    message
                        .items
                        .and_then(|items| items.inner.into_iter().next())
                        .and_then(|item| item.into_inner())
                        .and_then(|data| data.item_id)
                })
            })
            .collect())
    }

    /// Opens a pull subscription over the given folders.
    pub async fn subscribe_pull(
        &self,
        folder_ids: Vec<BaseFolderId>,
        event_types: Vec<EventType>,
        watermark: Option<String>,
        timeout: u32,
    ) -> Result<PullSubscription, Error> {
        let response = self
            .make_operation_request(Subscribe {
                request: SubscriptionRequest::Pull {
                    folder_ids,
                    event_types,
                    watermark,
                    timeout,
                },
            })
            .await?;

        let message = single_response_or_error(response)?;

        let subscription_id = message.subscription_id.ok_or(Error::MissingIdInResponse)?;
        let watermark = message.watermark.ok_or(Error::Processing {
            message: "pull subscription response has no watermark".to_string(),
        })?;

        Ok(PullSubscription {
            subscription_id,
            watermark,
        })
    }

    /// Opens a streaming subscription over the given folders, returning its
    /// identifier.
    pub async fn subscribe_streaming(
        &self,
        folder_ids: Vec<BaseFolderId>,
        event_types: Vec<EventType>,
    ) -> Result<String, Error> {
        let response = self
            .make_operation_request(Subscribe {
                request: SubscriptionRequest::Streaming {
                    folder_ids,
                    event_types,
                    subscribe_to_all_folders: false,
                },
            })
            .await?;

        let message = single_response_or_error(response)?;

        message.subscription_id.ok_or(Error::MissingIdInResponse)
    }

    /// Ends a subscription.
    pub async fn unsubscribe(&self, subscription_id: String) -> Result<(), Error> {
        let response = self.make_operation_request(Unsubscribe { subscription_id }).await?;
        single_response_or_error(response)?;

        Ok(())
    }

    /// Polls a pull subscription for events since the given watermark.
    pub async fn get_events(
        &self,
        subscription_id: &str,
        watermark: &str,
    ) -> Result<Notification, Error> {
        let response = self
            .make_operation_request(GetEvents {
                subscription_id: subscription_id.to_string(),
                watermark: watermark.to_string(),
            })
            .await?;

        let message = single_response_or_error(response)?;

        message.notification.ok_or(Error::Processing {
            message: "event poll response has no notification".to_string(),
        })
    }

    /// Opens a streaming event connection held for the given number of
    /// minutes.
    ///
    /// The returned stream yields raw body chunks; the caller reassembles
    /// them into response documents, as chunk boundaries are arbitrary.
    pub async fn start_streaming_request(
        &self,
        subscription_id: &str,
        connection_timeout: u32,
    ) -> Result<ResponseStream, Error> {
        let request_body = Envelope {
            body: GetStreamingEvents {
                subscription_ids: vec![subscription_id.to_string()],
                connection_timeout,
            },
        }
        .as_xml_document()?;

        let request_id = Uuid::new_v4();
        log::debug!(
            "opening streaming event connection {request_id} to {}",
            self.endpoint
        );

        self.transport.send_streaming(&self.endpoint, request_body).await
    }
}

/// The back off delay requested via the first message of a response, if any.
///
/// Some server versions report throttling through a response message rather
/// than a fault; in that case no other message is present.
fn server_busy_delay<R>(response: &R) -> Option<u64>
where
    R: OperationResponse,
{
    let message = response.messages().first()?;

    if message.response_code() == Some(ERROR_SERVER_BUSY) {
        message.message_xml().and_then(MessageXml::back_off_milliseconds)
    } else {
        None
    }
}

fn log_network_payloads() -> bool {
    std::env::var(LOG_NETWORK_PAYLOADS_VAR).is_ok_and(|value| value == "1")
}
