//! In-memory card table for tests.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CardId, CardRecord};
use crate::storage::{CardTable, WriteError, Worklist};

/// Map-backed [`CardTable`] with injectable write failures.
#[derive(Debug, Default)]
pub struct MemoryCardTable {
    rows: BTreeMap<CardId, CardRecord>,
    failing: HashSet<CardId>,
    worklist: Vec<CardId>,
}

impl MemoryCardTable {
    /// Make every write for `id` fail with a store error. A duplicate insert
    /// still reports the unique violation first, as a real table would.
    pub fn fail_on(&mut self, id: CardId) {
        self.failing.insert(id);
    }

    pub fn with_worklist(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            worklist: ids.into_iter().map(CardId).collect(),
            ..Self::default()
        }
    }

    pub fn get(&self, id: CardId) -> Option<&CardRecord> {
        self.rows.get(&id)
    }

    pub fn rows(&self) -> Vec<&CardRecord> {
        self.rows.values().collect()
    }
}

#[async_trait]
impl CardTable for MemoryCardTable {
    async fn insert(&mut self, record: &CardRecord) -> std::result::Result<(), WriteError> {
        if self.rows.contains_key(&record.id) {
            return Err(WriteError::UniqueViolation(format!(
                "duplicate key id={}",
                record.id
            )));
        }
        if self.failing.contains(&record.id) {
            return Err(WriteError::Store("injected insert failure".into()));
        }
        self.rows.insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&mut self, record: &CardRecord) -> std::result::Result<(), WriteError> {
        if self.failing.contains(&record.id) {
            return Err(WriteError::Store("injected update failure".into()));
        }
        if let Some(row) = self.rows.get_mut(&record.id) {
            *row = record.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl Worklist for MemoryCardTable {
    async fn card_ids(&mut self) -> Result<Vec<CardId>> {
        Ok(self.worklist.clone())
    }
}
