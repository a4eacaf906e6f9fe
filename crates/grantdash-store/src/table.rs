//! The working table of grant records.
//!
//! Records are held as loaded and never mutated by views; scores and deadline
//! status are recomputed each time [`GrantTable::scored`] is called.

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use grantdash_core::scoring::{ScoredGrantRecord, score_all};
use grantdash_core::{GrantRecord, grants};

use crate::StoreError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrantTable {
    records: Vec<GrantRecord>,
}

impl GrantTable {
    pub fn new(records: Vec<GrantRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[GrantRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<GrantRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Score every record against `today`, in table order.
    pub fn scored(&self, today: NaiveDate) -> Vec<ScoredGrantRecord<'_>> {
        score_all(&self.records, today)
    }

    /// Fetch a single record by exact opportunity number.
    pub fn get(&self, opportunity_number: &str) -> Result<&GrantRecord, StoreError> {
        self.records
            .iter()
            .find(|r| r.opportunity_number == opportunity_number)
            .ok_or_else(|| StoreError::NotFound(opportunity_number.to_string()))
    }

    /// The whole table as one scored Arrow batch.
    pub fn to_batch(&self, today: NaiveDate) -> Result<RecordBatch, StoreError> {
        Ok(grants::scored_batch(&self.scored(today))?)
    }
}

impl From<Vec<GrantRecord>> for GrantTable {
    fn from(records: Vec<GrantRecord>) -> Self {
        Self::new(records)
    }
}
