/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Change-notification subscription management.
//!
//! [`SubscriptionManager`] keeps a single subscription alive against a
//! server, translating raw notification events into aggregated
//! [`FolderChanges`] signals. It runs as one cooperative task; no locking is
//! involved.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::{EwsClient, Transport};
use crate::operations::{ConnectionStatus, GetStreamingEventsResponse, OperationResponse};
use crate::types::common::{BaseFolderId, FolderId};
use crate::types::events::{Event, EventType, Notification};
use crate::types::response::ResponseMessage;
use crate::types::soap::Envelope;
use crate::Error;

/// Settings for a [`SubscriptionManager`].
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// The folders to watch. An empty list subscribes to the whole mailbox.
    pub folder_ids: Vec<BaseFolderId>,

    pub event_types: Vec<EventType>,

    /// Whether to hold a streaming connection rather than poll.
    pub use_streaming: bool,

    /// Minutes of polling inactivity after which the server discards a pull
    /// subscription.
    pub request_timeout_minutes: u32,

    /// Interval between event polls on a pull subscription.
    pub poll_interval: Duration,

    /// Minutes a streaming connection is held open before the server closes
    /// it and a new one is issued.
    pub connection_timeout_minutes: u32,

    /// The window of stream silence after which buffered chunks are taken to
    /// form a complete response document.
    pub debounce: Duration,

    /// The delay before retrying after the first failed notification cycle.
    pub initial_backoff: Duration,

    /// The retry delay cap; doubling stops here.
    pub max_backoff: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        SubscriptionConfig {
            folder_ids: Vec::new(),
            event_types: EventType::for_sync(),
            use_streaming: true,
            request_timeout_minutes: 30,
            poll_interval: Duration::from_secs(10),
            connection_timeout_minutes: 30,
            debounce: Duration::from_millis(250),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// The lifecycle state of the managed subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No subscription exists.
    Unsubscribed,

    /// A subscribe request is in flight.
    Subscribing,

    /// A streaming connection is being served.
    Streaming,

    /// A pull subscription is being polled.
    Polling,

    /// The previous cycle failed and the subscription is being torn down
    /// before resubscribing.
    Resetting,
}

/// An aggregated change signal.
///
/// One signal summarizes every event delivered in a single notification
/// burst; consumers react by reconciling the named folders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderChanges {
    /// Whether the folder hierarchy itself changed, requiring a folder-tree
    /// resync.
    pub tree_changed: bool,

    /// The folders whose contents changed, in first-affected order.
    pub folder_ids: Vec<FolderId>,
}

/// Keeps a change-notification subscription alive and forwards its events as
/// [`FolderChanges`] signals.
pub struct SubscriptionManager<T> {
    client: Arc<EwsClient<T>>,
    config: SubscriptionConfig,
    changes: mpsc::UnboundedSender<FolderChanges>,
    cancel: CancellationToken,
    state: SubscriptionState,
    subscription_id: Option<String>,
    watermark: Option<String>,
    backoff: Duration,
}

impl<T> SubscriptionManager<T>
where
    T: Transport,
{
    /// Creates a manager and the receiving end of its change signals.
    pub fn new(
        client: Arc<EwsClient<T>>,
        config: SubscriptionConfig,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<FolderChanges>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let backoff = config.initial_backoff;
        let manager = SubscriptionManager {
            client,
            config,
            changes: sender,
            cancel,
            state: SubscriptionState::Unsubscribed,
            subscription_id: None,
            watermark: None,
            backoff,
        };

        (manager, receiver)
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Drives the subscription until the cancellation token fires.
    ///
    /// A failed cycle tears the subscription down and retries after a bounded
    /// exponentially-growing delay; a successful resubscribe resets the
    /// delay. A pull subscription's watermark survives resets, so no events
    /// are lost across them.
    pub async fn run(&mut self) {
        while !self.cancel.is_cancelled() {
            match self.run_cycle().await {
                // A cycle only completes on cancellation.
                Ok(()) => break,

                Err(err) => {
                    log::warn!(
                        "notification cycle failed ({}): {err}; resetting subscription",
                        self.subscription_id.as_deref().unwrap_or("not subscribed")
                    );

                    self.state = SubscriptionState::Resetting;
                    self.drop_subscription().await;

                    let delay = self.backoff;
                    self.backoff = (self.backoff * 2).min(self.config.max_backoff);

                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.drop_subscription().await;
        self.state = SubscriptionState::Unsubscribed;
    }

    async fn run_cycle(&mut self) -> Result<(), Error> {
        self.state = SubscriptionState::Subscribing;

        if self.config.use_streaming {
            self.subscribe_streaming().await?;
            self.backoff = self.config.initial_backoff;
            self.state = SubscriptionState::Streaming;
            self.serve_streaming().await
        } else {
            self.subscribe_pull().await?;
            self.backoff = self.config.initial_backoff;
            self.state = SubscriptionState::Polling;
            self.serve_polling().await
        }
    }

    async fn subscribe_pull(&mut self) -> Result<(), Error> {
        let subscription = self
            .client
            .subscribe_pull(
                self.config.folder_ids.clone(),
                self.config.event_types.clone(),
                self.watermark.clone(),
                self.config.request_timeout_minutes,
            )
            .await?;

        log::info!("opened pull subscription {}", subscription.subscription_id);
        self.subscription_id = Some(subscription.subscription_id);
        self.watermark = Some(subscription.watermark);

        Ok(())
    }

    async fn subscribe_streaming(&mut self) -> Result<(), Error> {
        let subscription_id = self
            .client
            .subscribe_streaming(
                self.config.folder_ids.clone(),
                self.config.event_types.clone(),
            )
            .await?;

        log::info!("opened streaming subscription {subscription_id}");
        self.subscription_id = Some(subscription_id);

        // Streaming subscriptions have no resumption point; each starts
        // fresh.
        self.watermark = None;

        Ok(())
    }

    async fn serve_polling(&mut self) -> Result<(), Error> {
        let cancel = self.cancel.clone();

        // Events may already be waiting, so poll once before settling into
        // the timer.
        self.poll_events().await?;

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = interval.tick() => self.poll_events().await?,
            }
        }
    }

    /// Issues one logical event poll, following `MoreEvents` continuations
    /// until the server has no more pages, then emits a single aggregated
    /// signal for the whole burst.
    async fn poll_events(&mut self) -> Result<(), Error> {
        let mut accumulator = EventAccumulator::default();

        loop {
            let subscription_id = self.subscription_id.clone().ok_or(Error::Processing {
                message: "no subscription to poll".to_string(),
            })?;
            let watermark = self.watermark.clone().ok_or(Error::Processing {
                message: "no watermark to poll from".to_string(),
            })?;

            let notification = self.client.get_events(&subscription_id, &watermark).await?;

            let more_events = notification.more_events == Some(true);
            self.process_notification(&notification, &mut accumulator);

            if !more_events {
                break;
            }
        }

        self.emit(accumulator);

        Ok(())
    }

    async fn serve_streaming(&mut self) -> Result<(), Error> {
        let cancel = self.cancel.clone();

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let subscription_id = self.subscription_id.clone().ok_or(Error::Processing {
                message: "no subscription to stream".to_string(),
            })?;

            let mut stream = self
                .client
                .start_streaming_request(&subscription_id, self.config.connection_timeout_minutes)
                .await?;

            let mut buffer: Vec<u8> = Vec::new();
            let mut reissue = false;

            while !reissue {
                // Chunk boundaries are arbitrary, so a response document is
                // only taken as complete once the stream has been silent for
                // the debounce window.
                let next = if buffer.is_empty() {
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(()),
                        chunk = stream.next() => Some(chunk),
                    }
                } else {
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(()),
                        result = tokio::time::timeout(self.config.debounce, stream.next()) => {
                            result.ok()
                        }
                    }
                };

                match next {
                    Some(Some(Ok(chunk))) => buffer.extend_from_slice(&chunk),

                    Some(Some(Err(err))) => return Err(err),

                    // The server closed the connection; take any leftover
                    // data as a final document, then reconnect.
                    Some(None) => {
                        if !buffer.is_empty() {
                            self.process_stream_document(&buffer)?;
                        }
                        reissue = true;
                    }

                    // Debounce window elapsed with data buffered.
                    None => {
                        let closed = self.process_stream_document(&buffer)?;
                        buffer.clear();
                        reissue = closed;
                    }
                }
            }
        }
    }

    /// Parses one buffered streaming response document and emits its events.
    ///
    /// Returns whether the server declared the connection closed. A document
    /// which fails to parse is fatal to the streaming session.
    fn process_stream_document(&mut self, document: &[u8]) -> Result<bool, Error> {
        let envelope = Envelope::<GetStreamingEventsResponse>::from_xml_document(document)?;

        let mut closed = false;
        let mut accumulator = EventAccumulator::default();

        for message in envelope.body.into_messages() {
            let message = message.into_result()?;

            if message.connection_status == Some(ConnectionStatus::Closed) {
                closed = true;
            }

            if let Some(notifications) = &message.notifications {
                for notification in &notifications.inner {
                    self.process_notification(notification, &mut accumulator);
                }
            }
        }

        self.emit(accumulator);

        Ok(closed)
    }

    /// Folds a notification's events into the accumulator, advancing the
    /// stored watermark past every event seen.
    fn process_notification(
        &mut self,
        notification: &Notification,
        accumulator: &mut EventAccumulator,
    ) {
        for event in &notification.events {
            if let Some(watermark) = event.watermark() {
                self.watermark = Some(watermark.to_string());
            }

            accumulator.add(event);
        }
    }

    fn emit(&mut self, accumulator: EventAccumulator) {
        if accumulator.is_empty() || self.cancel.is_cancelled() {
            return;
        }

        if self.changes.send(accumulator.into_changes()).is_err() {
            log::warn!("folder change receiver was dropped; signal discarded");
        }
    }

    /// Ends the current subscription, ignoring failures; the server expires
    /// unreachable subscriptions on its own.
    async fn drop_subscription(&mut self) {
        if let Some(subscription_id) = self.subscription_id.take() {
            if let Err(err) = self.client.unsubscribe(subscription_id.clone()).await {
                log::debug!("ignoring unsubscribe failure for {subscription_id}: {err}");
            }
        }
    }
}

/// Collects the per-folder effect of a burst of events.
///
/// Folder-targeted events mark the tree as changed; item-targeted events
/// collect the containing folder, and moves/copies also collect the folder
/// the item left. Status and free/busy events have no effect here (their
/// watermarks are still consumed by the caller).
#[derive(Debug, Default)]
struct EventAccumulator {
    tree_changed: bool,
    folder_ids: Vec<FolderId>,
}

impl EventAccumulator {
    fn add(&mut self, event: &Event) {
        if !event.is_content_change() {
            return;
        }

        if event.affects_folder() {
            self.tree_changed = true;
            return;
        }

        let Some(object) = event.object() else {
            return;
        };

        if let Some(parent) = &object.parent_folder_id {
            self.push(parent);
        }

        if event.has_old_location() {
            if let Some(old_parent) = &object.old_parent_folder_id {
                self.push(old_parent);
            }
        }
    }

    fn push(&mut self, folder_id: &FolderId) {
        // Change keys vary between events for the same folder, so dedup on
        // the ID alone.
        if !self.folder_ids.iter().any(|known| known.id == folder_id.id) {
            self.folder_ids.push(folder_id.clone());
        }
    }

    fn is_empty(&self) -> bool {
        !self.tree_changed && self.folder_ids.is_empty()
    }

    fn into_changes(self) -> FolderChanges {
        FolderChanges {
            tree_changed: self.tree_changed,
            folder_ids: self.folder_ids,
        }
    }
}
