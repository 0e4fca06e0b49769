//! Generic domain model driven by a declarative rule set
//!
//! Every indicator group is one `DomainModel` parameterized by a `DomainSpec`:
//! the fields it owns (with valid ranges and documented defaults), the
//! producers it reads, and a plain update function run once per city per year.
//! Range clamping and breakdown normalization are applied here, after the
//! update function, so no rule can store an out-of-range value.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::error::{Result, SimError};
use crate::core::types::{CityId, DomainKind, Year};
use crate::urban::snapshot::DependencyView;
use crate::urban::state::{
    normalize_breakdown, CityRecord, DomainState, FieldKind, FieldSpec, FieldValue,
};

/// Per-city update rule
pub type UpdateFn = fn(&mut CityContext<'_, '_>) -> Result<()>;

/// What a consumer sees when a producer does not model one of its cities
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingCityPolicy {
    /// Structural mismatch: rejected at initialization, `InvalidState` at step
    Fail,
    /// Fall back to the producer field's documented default
    UseDefault,
}

/// Which year's producer state a consumer reads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coupling {
    /// End-of-previous-year snapshot (synchronous update)
    PreviousYear,
    /// Producer's output for the year in progress; the producer must precede
    /// the consumer in evaluation order
    SameYear,
}

/// "consumer reads producer"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DependencyEdge {
    pub consumer: DomainKind,
    pub producer: DomainKind,
    pub policy: MissingCityPolicy,
    pub coupling: Coupling,
}

impl DependencyEdge {
    pub fn new(consumer: DomainKind, producer: DomainKind, policy: MissingCityPolicy) -> Self {
        Self {
            consumer,
            producer,
            policy,
            coupling: Coupling::PreviousYear,
        }
    }

    pub fn same_year(mut self) -> Self {
        self.coupling = Coupling::SameYear;
        self
    }
}

/// Declarative description of one domain
#[derive(Clone)]
pub struct DomainSpec {
    pub kind: DomainKind,
    pub fields: &'static [FieldSpec],
    pub dependencies: Vec<DependencyEdge>,
    pub update: UpdateFn,
}

impl DomainSpec {
    pub fn new(kind: DomainKind, fields: &'static [FieldSpec], update: UpdateFn) -> Self {
        Self {
            kind,
            fields,
            dependencies: Vec::new(),
            update,
        }
    }

    /// Hard dependency: every city of this domain must exist in `producer`
    pub fn requires(self, producer: DomainKind) -> Self {
        self.depends_on(producer, MissingCityPolicy::Fail)
    }

    /// Soft dependency: missing cities read the producer's defaults
    pub fn reads(self, producer: DomainKind) -> Self {
        self.depends_on(producer, MissingCityPolicy::UseDefault)
    }

    pub fn depends_on(mut self, producer: DomainKind, policy: MissingCityPolicy) -> Self {
        self.dependencies
            .push(DependencyEdge::new(self.kind, producer, policy));
        self
    }

    /// Add a pre-built edge (e.g. a same-year one)
    pub fn with_edge(mut self, edge: DependencyEdge) -> Self {
        self.dependencies.push(edge);
        self
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl std::fmt::Debug for DomainSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainSpec")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Random stream for one domain in one year.
///
/// Each (domain, year) pair gets an independent ChaCha8 stream so a step's
/// draws depend only on the seed, never on how many draws other domains made.
pub fn year_rng(seed: u64, kind: DomainKind, year: Year) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ (year as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    rng.set_stream(kind.index() as u64);
    rng
}

/// Owns one domain's state and advances it one year at a time
#[derive(Clone, Debug)]
pub struct DomainModel {
    spec: DomainSpec,
    state: DomainState,
}

impl DomainModel {
    /// Validate initial state against the field declarations.
    ///
    /// Missing scalars take the declared default, out-of-range values are
    /// clamped, breakdowns are normalized.
    pub fn new(spec: DomainSpec, initial: DomainState) -> Result<Self> {
        let mut state = DomainState::new();

        for (city, record) in initial.iter() {
            let mut checked = CityRecord::new();

            for (name, value) in record {
                let field = spec.field(name).ok_or_else(|| {
                    SimError::ConfigValidation(format!(
                        "{}: unknown field '{}' for {}",
                        spec.kind, name, city
                    ))
                })?;
                checked.insert(name.clone(), validate_initial(&spec, field, city, value)?);
            }

            for field in spec.fields.iter().filter(|f| !f.is_breakdown()) {
                if checked.contains_key(field.name) {
                    continue;
                }
                let default = field.default.ok_or_else(|| {
                    SimError::ConfigValidation(format!(
                        "{}: required field '{}' missing for {}",
                        spec.kind, field.name, city
                    ))
                })?;
                tracing::trace!("{}: {} defaults {} to {}", spec.kind, city, field.name, default);
                checked.insert(field.name.to_string(), FieldValue::Scalar(default));
            }

            state.insert_city(city.clone(), checked);
        }

        Ok(Self { spec, state })
    }

    /// Rebuild a model around state that already passed validation
    pub(crate) fn from_recorded(spec: DomainSpec, state: DomainState) -> Self {
        Self { spec, state }
    }

    pub fn kind(&self) -> DomainKind {
        self.spec.kind
    }

    pub fn spec(&self) -> &DomainSpec {
        &self.spec
    }

    pub fn state(&self) -> &DomainState {
        &self.state
    }

    pub fn dependencies(&self) -> &[DependencyEdge] {
        &self.spec.dependencies
    }

    /// Compute next year's state without touching the current one
    pub fn step(
        &self,
        year: Year,
        deps: &DependencyView<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Result<DomainState> {
        let mut next = DomainState::new();

        for (city, record) in self.state.iter() {
            let mut ctx = CityContext {
                kind: self.spec.kind,
                fields: self.spec.fields,
                year,
                city,
                previous: record,
                next: record.clone(),
                deps,
                rng: &mut *rng,
            };
            (self.spec.update)(&mut ctx)?;
            let mut updated = ctx.next;
            self.enforce_invariants(record, &mut updated);
            next.insert_city(city.clone(), updated);
        }

        Ok(next)
    }

    pub(crate) fn commit(&mut self, state: DomainState) {
        self.state = state;
    }

    fn enforce_invariants(&self, previous: &CityRecord, record: &mut CityRecord) {
        for field in self.spec.fields {
            match field.kind {
                FieldKind::Parameter => {
                    if let Some(old) = previous.get(field.name) {
                        record.insert(field.name.to_string(), old.clone());
                    }
                }
                FieldKind::Scalar => {
                    if let Some(FieldValue::Scalar(v)) = record.get_mut(field.name) {
                        let clamped = field.clamp(*v);
                        if clamped != *v {
                            tracing::trace!("{}.{} clamped {} -> {}", self.spec.kind, field.name, v, clamped);
                        }
                        *v = clamped;
                    }
                }
                FieldKind::Breakdown => {
                    if let Some(FieldValue::Breakdown(parts)) = record.get_mut(field.name) {
                        normalize_breakdown(parts);
                    }
                }
            }
        }
    }
}

fn validate_initial(
    spec: &DomainSpec,
    field: &FieldSpec,
    city: &CityId,
    value: &FieldValue,
) -> Result<FieldValue> {
    let invalid = |reason: &str| {
        SimError::ConfigValidation(format!("{}: {}.{} {}", spec.kind, city, field.name, reason))
    };

    match (field.kind, value) {
        (FieldKind::Breakdown, FieldValue::Breakdown(parts)) => {
            if parts.is_empty() {
                return Err(invalid("breakdown is empty"));
            }
            if parts.values().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(invalid("breakdown has a negative or non-finite part"));
            }
            if parts.values().sum::<f64>() <= 0.0 {
                return Err(invalid("breakdown sums to zero"));
            }
            let mut parts = parts.clone();
            normalize_breakdown(&mut parts);
            Ok(FieldValue::Breakdown(parts))
        }
        (FieldKind::Breakdown, FieldValue::Scalar(_)) => Err(invalid("expects a breakdown")),
        (_, FieldValue::Breakdown(_)) => Err(invalid("expects a number")),
        (_, FieldValue::Scalar(v)) => {
            if !v.is_finite() {
                return Err(invalid("is not finite"));
            }
            if !field.contains(*v) {
                tracing::debug!(
                    "{}: {}.{} = {} outside [{}, {}], clamping",
                    spec.kind, city, field.name, v, field.min, field.max
                );
            }
            Ok(FieldValue::Scalar(field.clamp(*v)))
        }
    }
}

/// Everything an update rule may touch for one city
pub struct CityContext<'a, 'v> {
    kind: DomainKind,
    fields: &'static [FieldSpec],
    year: Year,
    city: &'a CityId,
    previous: &'a CityRecord,
    next: CityRecord,
    deps: &'a DependencyView<'v>,
    rng: &'a mut ChaCha8Rng,
}

impl<'a, 'v> CityContext<'a, 'v> {
    pub fn year(&self) -> Year {
        self.year
    }

    pub fn city(&self) -> &CityId {
        self.city
    }

    fn invalid(&self, reason: String) -> SimError {
        SimError::InvalidState {
            domain: self.kind,
            year: self.year,
            reason,
        }
    }

    fn declared(&self, field: &str) -> Result<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| self.invalid(format!("{} declares no field '{}'", self.kind, field)))
    }

    /// Own end-of-previous-year value
    pub fn value(&self, field: &str) -> Result<f64> {
        self.previous
            .get(field)
            .and_then(|v| v.as_scalar())
            .ok_or_else(|| self.invalid(format!("{} has no scalar '{}'", self.city, field)))
    }

    /// Own value as already updated this step (falls back to previous)
    pub fn current(&self, field: &str) -> Result<f64> {
        self.next
            .get(field)
            .and_then(|v| v.as_scalar())
            .ok_or_else(|| self.invalid(format!("{} has no scalar '{}'", self.city, field)))
    }

    pub fn set(&mut self, field: &str, value: f64) -> Result<()> {
        let spec = self.declared(field)?;
        if spec.is_breakdown() {
            return Err(self.invalid(format!("'{}' is a breakdown", field)));
        }
        self.next.insert(spec.name.to_string(), FieldValue::Scalar(value));
        Ok(())
    }

    /// Own breakdown as currently staged; `None` when not modeled for this city
    pub fn breakdown(&self, field: &str) -> Option<BTreeMap<String, f64>> {
        self.next.get(field).and_then(|v| v.as_breakdown()).cloned()
    }

    pub fn set_breakdown(&mut self, field: &str, parts: BTreeMap<String, f64>) -> Result<()> {
        let spec = self.declared(field)?;
        if !spec.is_breakdown() {
            return Err(self.invalid(format!("'{}' is not a breakdown", field)));
        }
        self.next.insert(spec.name.to_string(), FieldValue::Breakdown(parts));
        Ok(())
    }

    /// Bounded perturbation drawn uniformly from `[lo, hi]`
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    /// Producer scalar for this city
    pub fn input(&self, producer: DomainKind, field: &str) -> Result<f64> {
        self.deps.scalar(producer, self.city, field)
    }

    /// Producer scalar as a ratio to a documented baseline
    pub fn influence(&self, producer: DomainKind, field: &str, baseline: f64) -> Result<f64> {
        Ok(self.input(producer, field)? / baseline)
    }

    pub fn input_breakdown(
        &self,
        producer: DomainKind,
        field: &str,
    ) -> Result<Option<&'v BTreeMap<String, f64>>> {
        self.deps.breakdown(producer, self.city, field)
    }
}
