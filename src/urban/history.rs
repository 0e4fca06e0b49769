//! Append-only record of completed years

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::core::error::{Result, SimError};
use crate::core::types::{CityId, DomainKind, Year};
use crate::urban::snapshot::SystemSnapshot;

/// Full-system snapshots keyed by year. Written only by the orchestrator.
#[derive(Clone, Debug, Default)]
pub struct History {
    records: BTreeMap<Year, Arc<SystemSnapshot>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, year: Year, snapshot: Arc<SystemSnapshot>) -> Result<()> {
        if self.records.contains_key(&year) {
            return Err(SimError::DuplicateYear(year));
        }
        self.records.insert(year, snapshot);
        Ok(())
    }

    /// Snapshot for a completed year; `None` if the year was never recorded
    pub fn query(&self, year: Year) -> Option<Arc<SystemSnapshot>> {
        self.records.get(&year).cloned()
    }

    /// Recorded snapshots in `[start, end]`, ascending
    pub fn query_range(&self, start: Year, end: Year) -> Vec<Arc<SystemSnapshot>> {
        if start > end {
            return Vec::new();
        }
        self.records.range(start..=end).map(|(_, s)| Arc::clone(s)).collect()
    }

    pub fn final_year(&self) -> Option<Year> {
        self.records.keys().next_back().copied()
    }

    pub fn first_year(&self) -> Option<Year> {
        self.records.keys().next().copied()
    }

    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.records.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time series of one scalar; years where the city or field is absent are skipped
    pub fn series(&self, domain: DomainKind, city: &CityId, field: &str) -> Vec<(Year, f64)> {
        self.records
            .iter()
            .filter_map(|(year, s)| s.scalar(domain, city, field).map(|v| (*year, v)))
            .collect()
    }

    /// Time series of one breakdown part
    pub fn breakdown_series(
        &self,
        domain: DomainKind,
        city: &CityId,
        field: &str,
        part: &str,
    ) -> Vec<(Year, f64)> {
        self.records
            .iter()
            .filter_map(|(year, s)| {
                s.breakdown(domain, city, field)
                    .and_then(|parts| parts.get(part))
                    .map(|v| (*year, *v))
            })
            .collect()
    }
}

impl Serialize for History {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.records.iter().map(|(year, s)| (year, s.as_ref())))
    }
}
