/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Change-notification event structures.

use serde::Deserialize;

use crate::types::common::{DateTime, FolderId, ItemId};

/// A type of event which can be subscribed to.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/eventtype>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    Copied,
    Created,
    Deleted,
    Modified,
    Moved,
    NewMail,
    FreeBusyChanged,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Copied => "CopiedEvent",
            EventType::Created => "CreatedEvent",
            EventType::Deleted => "DeletedEvent",
            EventType::Modified => "ModifiedEvent",
            EventType::Moved => "MovedEvent",
            EventType::NewMail => "NewMailEvent",
            EventType::FreeBusyChanged => "FreeBusyChangedEvent",
        }
    }

    /// The event types a synchronizing client subscribes to.
    pub fn for_sync() -> Vec<EventType> {
        vec![
            EventType::NewMail,
            EventType::Created,
            EventType::Deleted,
            EventType::Modified,
            EventType::Moved,
            EventType::Copied,
        ]
    }
}

/// The payload shared by all object-affecting events.
///
/// Exactly one of `item_id` and `folder_id` is present, identifying whether
/// the event's target is an item or a folder.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectEvent {
    pub watermark: Option<String>,

    pub time_stamp: Option<DateTime>,

    pub item_id: Option<ItemId>,

    pub folder_id: Option<FolderId>,

    pub parent_folder_id: Option<FolderId>,

    /// The target's identifier before a move or copy.
    pub old_item_id: Option<ItemId>,

    pub old_folder_id: Option<FolderId>,

    pub old_parent_folder_id: Option<FolderId>,

    pub unread_count: Option<u32>,
}

/// A keep-alive event carrying only a watermark.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct StatusEvent {
    pub watermark: Option<String>,
}

/// A single notification event.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getevents>
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub enum Event {
    CopiedEvent(ObjectEvent),
    CreatedEvent(ObjectEvent),
    DeletedEvent(ObjectEvent),
    FreeBusyChangedEvent(ObjectEvent),
    ModifiedEvent(ObjectEvent),
    MovedEvent(ObjectEvent),
    NewMailEvent(ObjectEvent),
    StatusEvent(StatusEvent),
}

impl Event {
    pub fn watermark(&self) -> Option<&str> {
        match self {
            Event::CopiedEvent(event)
            | Event::CreatedEvent(event)
            | Event::DeletedEvent(event)
            | Event::FreeBusyChangedEvent(event)
            | Event::ModifiedEvent(event)
            | Event::MovedEvent(event)
            | Event::NewMailEvent(event) => event.watermark.as_deref(),

            Event::StatusEvent(event) => event.watermark.as_deref(),
        }
    }

    /// The object payload, for events which carry one.
    pub fn object(&self) -> Option<&ObjectEvent> {
        match self {
            Event::CopiedEvent(event)
            | Event::CreatedEvent(event)
            | Event::DeletedEvent(event)
            | Event::FreeBusyChangedEvent(event)
            | Event::ModifiedEvent(event)
            | Event::MovedEvent(event)
            | Event::NewMailEvent(event) => Some(event),

            Event::StatusEvent(_) => None,
        }
    }

    /// Whether the event's target is a folder rather than an item.
    pub fn affects_folder(&self) -> bool {
        self.object()
            .map(|event| event.folder_id.is_some())
            .unwrap_or(false)
    }

    /// Whether the event carries a pre-move/copy location in addition to the
    /// current one.
    pub fn has_old_location(&self) -> bool {
        matches!(self, Event::CopiedEvent(_) | Event::MovedEvent(_))
    }

    /// Whether the event changes mailbox contents, as opposed to keep-alive
    /// and free/busy signals.
    pub fn is_content_change(&self) -> bool {
        !matches!(self, Event::StatusEvent(_) | Event::FreeBusyChangedEvent(_))
    }
}

/// A group of events delivered for a single subscription.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/notification-ex15websvcsotherref>
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Notification {
    pub subscription_id: String,

    pub previous_watermark: Option<String>,

    pub more_events: Option<bool>,

    #[serde(rename = "$value", default)]
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use crate::test_utils::deserialize_content;

    use super::*;

    #[test]
    fn deserialize_notification_with_mixed_events() {
        let notification: Notification = deserialize_content(
            r#"<Notification>
                 <SubscriptionId>HQB3YW0=</SubscriptionId>
                 <PreviousWatermark>AQAAAM=</PreviousWatermark>
                 <MoreEvents>false</MoreEvents>
                 <StatusEvent><Watermark>AQAAAN=</Watermark></StatusEvent>
                 <NewMailEvent>
                   <Watermark>AQAAAO=</Watermark>
                   <TimeStamp>2024-03-05T11:59:31Z</TimeStamp>
                   <ItemId Id="AAMkAA==" ChangeKey="CQAAAA=="/>
                   <ParentFolderId Id="AQMkAA==" ChangeKey="AQAAAA=="/>
                 </NewMailEvent>
                 <MovedEvent>
                   <Watermark>AQAAAP=</Watermark>
                   <ItemId Id="AAMkAB=="/>
                   <ParentFolderId Id="AQMkAB=="/>
                   <OldItemId Id="AAMkAA=="/>
                   <OldParentFolderId Id="AQMkAA=="/>
                 </MovedEvent>
               </Notification>"#,
        );

        assert_eq!(notification.subscription_id, "HQB3YW0=");
        assert_eq!(notification.more_events, Some(false));
        assert_eq!(notification.events.len(), 3, "all events should deserialize");

        assert!(
            matches!(notification.events[0], Event::StatusEvent(_)),
            "status events should be recognized"
        );
        assert_eq!(notification.events[0].watermark(), Some("AQAAAN="));
        assert!(!notification.events[0].is_content_change());

        let new_mail = notification.events[1]
            .object()
            .expect("new mail events should carry an object payload");
        assert_eq!(
            new_mail.parent_folder_id.as_ref().map(|id| id.id.as_str()),
            Some("AQMkAA=="),
            "parent folder should match original document"
        );
        assert!(!notification.events[1].affects_folder());

        assert!(notification.events[2].has_old_location());
        let moved = notification.events[2].object().expect("moved event payload");
        assert_eq!(
            moved
                .old_parent_folder_id
                .as_ref()
                .map(|id| id.id.as_str()),
            Some("AQMkAA==")
        );
    }

    #[test]
    fn folder_events_are_distinguished_from_item_events() {
        let notification: Notification = deserialize_content(
            r#"<Notification>
                 <SubscriptionId>HQB3YW0=</SubscriptionId>
                 <CreatedEvent>
                   <Watermark>AQAAAQ=</Watermark>
                   <FolderId Id="AQMkAC=="/>
                   <ParentFolderId Id="AQMkAD=="/>
                 </CreatedEvent>
               </Notification>"#,
        );

        assert!(
            notification.events[0].affects_folder(),
            "an event with a folder target should report as a folder event"
        );
    }
}
