// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-lifetime submission store.
//!
//! Contents are lost on restart. Each key lives in one `DashMap` shard, and
//! the entry API holds that shard's write lock across the existence check and
//! the write.

use super::{StoreError, SubmissionStore, UpsertOutcome};
use crate::models::Submission;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory submission store, cheap to clone.
#[derive(Clone, Default)]
pub struct MemoryStore {
    submissions: Arc<DashMap<String, Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Submission>, StoreError> {
        Ok(self.submissions.get(id).map(|entry| entry.value().clone()))
    }

    async fn upsert(&self, submission: Submission) -> Result<UpsertOutcome, StoreError> {
        match self.submissions.entry(submission.id().to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(submission);
                Ok(UpsertOutcome::Updated)
            }
            Entry::Vacant(entry) => {
                entry.insert(submission);
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.submissions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentData;

    fn submission(id: &str, name: &str) -> Submission {
        Submission {
            student: StudentData::new(id, name, "555-0100", "a@b.co"),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            source: "qr_scan".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let store = MemoryStore::new();

        let first = store.upsert(submission("1", "Jane")).await.unwrap();
        let second = store.upsert(submission("1", "Janet")).await.unwrap();

        assert_eq!(first, UpsertOutcome::Created);
        assert_eq!(second, UpsertOutcome::Updated);
        assert_eq!(store.count().await.unwrap(), 1);

        let stored = store.get("1").await.unwrap().unwrap();
        assert_eq!(stored.student.name, "Janet");
    }

    #[tokio::test]
    async fn distinct_ids_are_counted_separately() {
        let store = MemoryStore::new();
        store.upsert(submission("1", "A")).await.unwrap();
        store.upsert(submission("2", "B")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert!(store.get("3").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_for_one_id_create_once() {
        let store = MemoryStore::new();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert(submission("42", &format!("Writer {}", i)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() == UpsertOutcome::Created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
