/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Folder reconciliation.
//!
//! Reconciliation brings a local cache of a folder back in line with the
//! server: the remote and local listings are fetched concurrently, diffed by
//! identifier and change key, and detail fetches for new and changed items
//! are dispatched in batches through per-kind factories.

use std::future::Future;
use std::sync::Arc;

use futures::future::LocalBoxFuture;
use fxhash::FxHashMap;

use crate::client::{EwsClient, Transport};
use crate::types::common::{BaseFolderId, FolderId};
use crate::types::items::{ItemKind, ItemRecord};
use crate::Error;

/// Kinds are dispatched in a fixed order so runs are reproducible.
const KIND_ORDER: [ItemKind; 4] = [
    ItemKind::Message,
    ItemKind::Calendar,
    ItemKind::Contact,
    ItemKind::Task,
];

/// A local cache record for one remote item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// The server-assigned identifier under which the item is cached.
    pub remote_id: String,

    /// The change key last seen for the item, if any.
    pub change_key: Option<String>,

    pub kind: ItemKind,
}

/// The local cache a folder is reconciled against.
pub trait LocalStore: Send + Sync {
    /// Lists every cached entry for a folder.
    fn list_folder(
        &self,
        folder_id: &FolderId,
    ) -> impl Future<Output = Result<Vec<CacheEntry>, Error>> + Send;

    /// Discards an entry's cached payload and records its new change key,
    /// ahead of a detail refetch.
    fn reset_item(
        &self,
        folder_id: &FolderId,
        record: &ItemRecord,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Creates an empty entry for a newly-discovered item, ahead of a detail
    /// fetch.
    fn create_placeholder(
        &self,
        folder_id: &FolderId,
        record: &ItemRecord,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes the entries for items no longer present on the server.
    fn remove_items(
        &self,
        folder_id: &FolderId,
        remote_ids: &[String],
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Creates detail-fetch jobs for batches of records of a single kind.
///
/// One factory is registered per [`ItemKind`]; how a batch's details are
/// fetched and mapped into the store is entirely the factory's concern.
pub trait DetailFetchFactory {
    fn create_job(
        &self,
        folder_id: &FolderId,
        kind: ItemKind,
        batch: Vec<ItemRecord>,
    ) -> LocalBoxFuture<'static, Result<(), Error>>;
}

/// Settings for a [`ReconcileEngine`].
#[derive(Clone, Copy, Debug)]
pub struct ReconcileConfig {
    /// The page size for the remote listing.
    pub page_size: u32,

    /// The number of records handed to each detail-fetch job.
    pub batch_size: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            page_size: 100,
            batch_size: 10,
        }
    }
}

/// The outcome of a reconciliation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub created: usize,
    pub deleted: usize,
}

/// Reconciles folders between an EWS server and a [`LocalStore`].
pub struct ReconcileEngine<T, S> {
    client: Arc<EwsClient<T>>,
    store: S,
    config: ReconcileConfig,
    factories: FxHashMap<ItemKind, Box<dyn DetailFetchFactory>>,
}

impl<T, S> ReconcileEngine<T, S>
where
    T: Transport,
    S: LocalStore,
{
    pub fn new(client: Arc<EwsClient<T>>, store: S, config: ReconcileConfig) -> Self {
        ReconcileEngine {
            client,
            store,
            config,
            factories: FxHashMap::default(),
        }
    }

    /// Registers the factory handling detail fetches for one item kind,
    /// replacing any previous registration.
    pub fn register_factory(&mut self, kind: ItemKind, factory: Box<dyn DetailFetchFactory>) {
        self.factories.insert(kind, factory);
    }

    /// Reconciles a single folder.
    ///
    /// The remote and local listings are fetched concurrently; either failure
    /// is fatal to the run. A kind with new or changed items but no
    /// registered factory fails the run before any job is started. Jobs run
    /// strictly sequentially.
    pub async fn reconcile_folder(&self, folder_id: &FolderId) -> Result<ReconcileSummary, Error> {
        let (remote, local) = futures::try_join!(
            self.client
                .list_folder_items(BaseFolderId::from(folder_id), self.config.page_size),
            self.store.list_folder(folder_id),
        )?;

        log::debug!(
            "reconciling folder {}: {} remote, {} local",
            folder_id.id,
            remote.len(),
            local.len()
        );

        let diff = diff_listings(remote, &local);
        let summary = diff.summary();

        for record in &diff.changed {
            self.store.reset_item(folder_id, record).await?;
        }

        for record in &diff.created {
            self.store.create_placeholder(folder_id, record).await?;
        }

        if !diff.deleted.is_empty() {
            self.store.remove_items(folder_id, &diff.deleted).await?;
        }

        let buckets = bucket_by_kind(diff.changed, diff.created);

        // All factories must be present before the first job is started, so
        // a misconfiguration never leaves a folder partially fetched.
        for kind in KIND_ORDER {
            if buckets.get(&kind).is_some_and(|records| !records.is_empty())
                && !self.factories.contains_key(&kind)
            {
                return Err(Error::MissingFetchFactory(kind));
            }
        }

        for kind in KIND_ORDER {
            let Some(records) = buckets.get(&kind) else {
                continue;
            };
            let Some(factory) = self.factories.get(&kind) else {
                continue;
            };

            for batch in records.chunks(self.config.batch_size) {
                factory.create_job(folder_id, kind, batch.to_vec()).await?;
            }
        }

        log::info!(
            "reconciled folder {}: {} unchanged, {} changed, {} created, {} deleted",
            folder_id.id,
            summary.unchanged,
            summary.changed,
            summary.created,
            summary.deleted
        );

        Ok(summary)
    }
}

/// The partition of a folder's items produced by [`diff_listings`].
#[derive(Debug, Default)]
struct ListingDiff {
    unchanged: usize,

    /// Records cached locally whose change key no longer matches, in local
    /// listing order.
    changed: Vec<ItemRecord>,

    /// Records with no local entry, in remote listing order.
    created: Vec<ItemRecord>,

    /// Identifiers cached locally but absent from the server.
    deleted: Vec<String>,
}

impl ListingDiff {
    fn summary(&self) -> ReconcileSummary {
        ReconcileSummary {
            unchanged: self.unchanged,
            changed: self.changed.len(),
            created: self.created.len(),
            deleted: self.deleted.len(),
        }
    }
}

/// Partitions the remote and local listings of a folder.
///
/// Every remote record and every local entry lands in exactly one of the
/// unchanged/changed/created/deleted buckets.
fn diff_listings(remote: Vec<ItemRecord>, local: &[CacheEntry]) -> ListingDiff {
    let mut index_by_id: FxHashMap<String, usize> = remote
        .iter()
        .enumerate()
        .map(|(index, record)| (record.item_id.id.clone(), index))
        .collect();
    let mut slots: Vec<Option<ItemRecord>> = remote.into_iter().map(Some).collect();

    let mut diff = ListingDiff::default();

    for entry in local {
        match index_by_id.remove(&entry.remote_id) {
            Some(index) => {
                if let Some(record) = slots[index].take() {
                    if record.item_id.change_key == entry.change_key {
                        diff.unchanged += 1;
                    } else {
                        diff.changed.push(record);
                    }
                }
            }

            None => diff.deleted.push(entry.remote_id.clone()),
        }
    }

    // Whatever the local listing didn't claim is new.
    diff.created.extend(slots.into_iter().flatten());

    diff
}

fn bucket_by_kind(
    changed: Vec<ItemRecord>,
    created: Vec<ItemRecord>,
) -> FxHashMap<ItemKind, Vec<ItemRecord>> {
    let mut buckets: FxHashMap<ItemKind, Vec<ItemRecord>> = FxHashMap::default();

    for record in changed.into_iter().chain(created) {
        buckets.entry(record.kind).or_default().push(record);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use crate::types::common::ItemId;
    use crate::types::properties::PropertyMap;

    use super::*;

    fn record(id: &str, change_key: &str, kind: ItemKind) -> ItemRecord {
        ItemRecord {
            kind,
            item_id: ItemId {
                id: id.to_string(),
                change_key: Some(change_key.to_string()),
            },
            parent_folder_id: None,
            properties: PropertyMap::new(),
        }
    }

    fn entry(id: &str, change_key: &str, kind: ItemKind) -> CacheEntry {
        CacheEntry {
            remote_id: id.to_string(),
            change_key: Some(change_key.to_string()),
            kind,
        }
    }

    #[test]
    fn diff_partitions_every_record_exactly_once() {
        let remote = vec![
            record("a", "1", ItemKind::Message),
            record("b", "2", ItemKind::Message),
            record("c", "1", ItemKind::Calendar),
        ];
        let local = vec![
            entry("a", "1", ItemKind::Message),
            entry("b", "1", ItemKind::Message),
            entry("d", "1", ItemKind::Message),
        ];

        let diff = diff_listings(remote, &local);
        let summary = diff.summary();

        assert_eq!(summary.unchanged, 1, "a is unchanged");
        assert_eq!(summary.changed, 1, "b has a new change key");
        assert_eq!(summary.created, 1, "c is new");
        assert_eq!(summary.deleted, 1, "d is gone from the server");
        assert_eq!(
            summary.unchanged + summary.changed + summary.created,
            3,
            "every remote record should land in exactly one bucket"
        );

        assert_eq!(diff.changed[0].item_id.id, "b");
        assert_eq!(diff.created[0].item_id.id, "c");
        assert_eq!(diff.deleted, vec!["d".to_string()]);
    }

    #[test]
    fn diff_of_identical_listings_is_empty() {
        let remote = vec![
            record("a", "1", ItemKind::Message),
            record("b", "1", ItemKind::Task),
        ];
        let local = vec![
            entry("a", "1", ItemKind::Message),
            entry("b", "1", ItemKind::Task),
        ];

        let diff = diff_listings(remote, &local);

        assert_eq!(diff.unchanged, 2);
        assert!(diff.changed.is_empty());
        assert!(diff.created.is_empty());
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn created_records_keep_remote_listing_order() {
        let remote = vec![
            record("c", "1", ItemKind::Message),
            record("a", "1", ItemKind::Message),
            record("b", "1", ItemKind::Message),
        ];

        let diff = diff_listings(remote, &[]);

        assert_eq!(
            diff.created
                .iter()
                .map(|record| record.item_id.id.as_str())
                .collect::<Vec<_>>(),
            vec!["c", "a", "b"],
            "creation order should follow the server listing, not identifier order"
        );
    }

    #[test]
    fn buckets_group_by_kind_preserving_order() {
        let changed = vec![record("a", "2", ItemKind::Message)];
        let created = vec![
            record("b", "1", ItemKind::Calendar),
            record("c", "1", ItemKind::Message),
        ];

        let buckets = bucket_by_kind(changed, created);

        assert_eq!(
            buckets[&ItemKind::Message]
                .iter()
                .map(|record| record.item_id.id.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "c"],
            "changed records should precede created ones within a kind"
        );
        assert_eq!(buckets[&ItemKind::Calendar].len(), 1);
    }
}
