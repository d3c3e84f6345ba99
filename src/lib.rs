/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A client for the Exchange Web Services (EWS) SOAP/XML protocol, providing
//! typed operations, a change-notification subscription manager, and an item
//! reconciliation engine for keeping a local cache current with a remote
//! Exchange mailbox.

mod client;
mod error;
pub mod operations;
mod reconcile;
mod subscription;
#[cfg(test)]
mod test_utils;
mod types;
mod xml;

pub use client::{EwsClient, HttpTransport, PullSubscription, ResponseStream, Transport};
pub use error::Error;
pub use reconcile::{
    CacheEntry, DetailFetchFactory, LocalStore, ReconcileConfig, ReconcileEngine, ReconcileSummary,
};
pub use subscription::{
    FolderChanges, SubscriptionConfig, SubscriptionManager, SubscriptionState,
};
pub use types::*;
