//! Per-domain, per-city state and field declarations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::CityId;

/// Sum every breakdown field is normalized to
pub const BREAKDOWN_TOTAL: f64 = 100.0;

/// A single indicator value for one city
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(f64),
    /// Percentage split across named sub-categories
    Breakdown(BTreeMap<String, f64>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            FieldValue::Scalar(v) => Some(*v),
            FieldValue::Breakdown(_) => None,
        }
    }

    pub fn as_breakdown(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            FieldValue::Breakdown(parts) => Some(parts),
            FieldValue::Scalar(_) => None,
        }
    }
}

/// All field values of one city within one domain
pub type CityRecord = BTreeMap<String, FieldValue>;

/// Current values of one domain across all cities it models
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainState {
    cities: BTreeMap<CityId, CityRecord>,
}

impl DomainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_city(&mut self, city: CityId, record: CityRecord) {
        self.cities.insert(city, record);
    }

    /// Builder-style scalar insert, mostly for tests and generated configs
    pub fn with_scalar(mut self, city: &str, field: &str, value: f64) -> Self {
        self.cities
            .entry(CityId::from(city))
            .or_default()
            .insert(field.to_string(), FieldValue::Scalar(value));
        self
    }

    /// Builder-style breakdown insert
    pub fn with_breakdown(mut self, city: &str, field: &str, parts: &[(&str, f64)]) -> Self {
        let parts = parts.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self.cities
            .entry(CityId::from(city))
            .or_default()
            .insert(field.to_string(), FieldValue::Breakdown(parts));
        self
    }

    pub fn city(&self, city: &CityId) -> Option<&CityRecord> {
        self.cities.get(city)
    }

    pub(crate) fn city_mut(&mut self, city: &CityId) -> Option<&mut CityRecord> {
        self.cities.get_mut(city)
    }

    pub fn contains(&self, city: &CityId) -> bool {
        self.cities.contains_key(city)
    }

    pub fn cities(&self) -> impl Iterator<Item = &CityId> {
        self.cities.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CityId, &CityRecord)> {
        self.cities.iter()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn scalar(&self, city: &CityId, field: &str) -> Option<f64> {
        self.cities.get(city)?.get(field)?.as_scalar()
    }

    pub fn breakdown(&self, city: &CityId, field: &str) -> Option<&BTreeMap<String, f64>> {
        self.cities.get(city)?.get(field)?.as_breakdown()
    }
}

/// How a field evolves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Drifts every year
    Scalar,
    /// Static per-city parameter, clamped but never drifted
    Parameter,
    /// Percentage split; optional per city
    Breakdown,
}

/// Declaration of one field of a domain
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Closed valid interval (scalars and parameters)
    pub min: f64,
    pub max: f64,
    /// Documented baseline used for missing initial values and for
    /// `MissingCityPolicy::UseDefault` reads. `None` means the field is required.
    pub default: Option<f64>,
}

impl FieldSpec {
    pub const fn scalar(name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self { name, kind: FieldKind::Scalar, min, max, default: Some(default) }
    }

    pub const fn required(name: &'static str, min: f64, max: f64) -> Self {
        Self { name, kind: FieldKind::Scalar, min, max, default: None }
    }

    pub const fn parameter(name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self { name, kind: FieldKind::Parameter, min, max, default: Some(default) }
    }

    pub const fn breakdown(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Breakdown, min: 0.0, max: BREAKDOWN_TOTAL, default: None }
    }

    pub fn is_breakdown(&self) -> bool {
        self.kind == FieldKind::Breakdown
    }

    /// Clamp into the closed interval; NaN collapses to the lower bound
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Clamp every part into `[0, 100]` and rescale so the parts sum to exactly 100.
///
/// A breakdown whose parts are all zero is spread evenly.
pub fn normalize_breakdown(parts: &mut BTreeMap<String, f64>) {
    if parts.is_empty() {
        return;
    }
    for value in parts.values_mut() {
        *value = if value.is_nan() { 0.0 } else { value.clamp(0.0, BREAKDOWN_TOTAL) };
    }
    let total: f64 = parts.values().sum();
    if total <= 0.0 {
        let even = BREAKDOWN_TOTAL / parts.len() as f64;
        parts.values_mut().for_each(|v| *v = even);
        return;
    }
    for value in parts.values_mut() {
        *value = *value / total * BREAKDOWN_TOTAL;
    }

    // Push the rounding residue into the largest part so the sum is exact
    let residue = BREAKDOWN_TOTAL - parts.values().sum::<f64>();
    if residue != 0.0 {
        if let Some(largest) = parts
            .values_mut()
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        {
            *largest += residue;
        }
    }
}
