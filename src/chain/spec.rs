//! Validated chain definition.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::document::{
    CarryoverRecord, CarryoverTable, ChainDocument, DayRecord, ExtraArrivalRecord,
    TypeChangeRecord,
};
use super::error::ChainError;
use crate::stats::Statistics;
use crate::store::ChainStore;

/// Retry behaviour of the customers of one source type who abandoned on the
/// previous day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarryoverRule {
    /// Fraction of the abandoned volume that comes back.
    pub probability: f64,
    /// Target type -> relative rate. Empty: retries keep their own type.
    /// Rates are normalized when the rule is applied.
    pub type_change_rates: BTreeMap<String, f64>,
}

impl CarryoverRule {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            type_change_rates: BTreeMap::new(),
        }
    }

    pub fn with_type_change(mut self, target: impl Into<String>, rate: f64) -> Self {
        self.type_change_rates.insert(target.into(), rate);
        self
    }

    pub fn rate_sum(&self) -> f64 {
        self.type_change_rates.values().sum()
    }

    /// Share of `source`'s abandoned customers that return as `target`.
    pub fn factor(&self, source: &str, target: &str) -> f64 {
        if self.probability <= 0.0 {
            return 0.0;
        }
        if self.type_change_rates.is_empty() {
            return if source == target { self.probability } else { 0.0 };
        }
        let rate = self.type_change_rates.get(target).copied().unwrap_or(0.0);
        if rate == 0.0 {
            return 0.0;
        }
        let sum = self.rate_sum();
        if sum <= 0.0 {
            return 0.0;
        }
        self.probability * rate / sum
    }

    fn check(&self, what: &str) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(format!(
                "{what}: probability {} is outside [0, 1]",
                self.probability
            ));
        }
        for (target, rate) in &self.type_change_rates {
            if target.is_empty() {
                return Err(format!("{what}: type change without customer type"));
            }
            if !rate.is_finite() || *rate < 0.0 {
                return Err(format!("{what}: rate {rate} for {target:?} is negative"));
            }
        }
        Ok(())
    }
}

/// How a day's statistical carryover is keyed.
#[derive(Debug, Clone, PartialEq)]
pub enum CarryoverShape {
    /// Every type's own abandons return with the same probability.
    Global(CarryoverRule),
    /// Source type name -> rule. An empty map carries nothing over.
    PerType(BTreeMap<String, CarryoverRule>),
}

impl Default for CarryoverShape {
    fn default() -> Self {
        CarryoverShape::PerType(BTreeMap::new())
    }
}

/// Which model file a day simulates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRef {
    /// Same model as the previous day.
    Reuse,
    Explicit(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DaySpec {
    pub model: ModelRef,
    /// Where to save the day's statistics; `None` keeps them in memory only.
    pub statistics_output: Option<String>,
    pub carryover: CarryoverShape,
}

impl DaySpec {
    pub fn new(model: ModelRef) -> Self {
        Self {
            model,
            statistics_output: None,
            carryover: CarryoverShape::default(),
        }
    }
}

/// Arrivals injected into day 1 on top of the model's own volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraArrival {
    pub customer_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainSpec {
    pub base_folder: PathBuf,
    pub days: Vec<DaySpec>,
    pub day0_statistics: Option<String>,
    pub initial_extra_arrivals: Vec<ExtraArrival>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

impl ChainSpec {
    pub fn new(base_folder: impl Into<PathBuf>) -> Self {
        Self {
            base_folder: base_folder.into(),
            days: Vec::new(),
            day0_statistics: None,
            initial_extra_arrivals: Vec::new(),
        }
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// References containing a path separator are used as given, bare names
    /// live in the base folder.
    pub fn resolve_path(&self, reference: &str) -> PathBuf {
        if reference.contains('/') || reference.contains('\\') {
            PathBuf::from(reference)
        } else {
            self.base_folder.join(reference)
        }
    }

    /// Resolves every day's model file, following `ModelRef::Reuse` back to
    /// the last explicit reference.
    pub fn resolve_models(&self) -> Result<Vec<PathBuf>, ChainError> {
        let mut out: Vec<PathBuf> = Vec::with_capacity(self.days.len());
        for (idx, day) in self.days.iter().enumerate() {
            let path = match &day.model {
                ModelRef::Explicit(r) => self.resolve_path(r),
                ModelRef::Reuse => match out.last() {
                    Some(prev) => prev.clone(),
                    None => return Err(ChainError::NoModelForDay { day: idx + 1 }),
                },
            };
            out.push(path);
        }
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        if self.days.is_empty() {
            return Err(ChainError::Config("the chain has no days".to_string()));
        }
        for (idx, day) in self.days.iter().enumerate() {
            let n = idx + 1;
            if let ModelRef::Explicit(r) = &day.model {
                if r.trim().is_empty() {
                    return Err(ChainError::Config(format!(
                        "day {n}: empty model reference (use reuse instead)"
                    )));
                }
            }
            match &day.carryover {
                CarryoverShape::Global(rule) => {
                    rule.check(&format!("day {n} global carryover"))
                        .map_err(ChainError::Config)?;
                    if !rule.type_change_rates.is_empty() {
                        return Err(ChainError::Config(format!(
                            "day {n}: a global carryover rule cannot change customer types"
                        )));
                    }
                }
                CarryoverShape::PerType(rules) => {
                    for (source, rule) in rules {
                        if source.is_empty() {
                            return Err(ChainError::Config(format!(
                                "day {n}: carryover rule without customer type"
                            )));
                        }
                        rule.check(&format!("day {n} carryover for {source:?}"))
                            .map_err(ChainError::Config)?;
                    }
                }
            }
        }
        for (idx, extra) in self.initial_extra_arrivals.iter().enumerate() {
            if extra.customer_type.trim().is_empty() {
                return Err(ChainError::Config(format!(
                    "extra arrival record {} has no customer type",
                    idx + 1
                )));
            }
        }
        Ok(())
    }

    pub fn from_document(doc: ChainDocument) -> Result<Self, ChainError> {
        let mut days = Vec::with_capacity(doc.days.len());
        for (idx, record) in doc.days.into_iter().enumerate() {
            let n = idx + 1;
            let model = match non_empty(record.model) {
                Some(r) => ModelRef::Explicit(r),
                None => ModelRef::Reuse,
            };
            let carryover = match record.carryover {
                None => CarryoverShape::default(),
                Some(CarryoverTable::Global { probability }) => {
                    CarryoverShape::Global(CarryoverRule::new(probability))
                }
                Some(CarryoverTable::PerType { rules }) => {
                    let mut map = BTreeMap::new();
                    for rec in rules {
                        let mut rule = CarryoverRule::new(rec.probability);
                        for change in rec.type_changes {
                            if rule
                                .type_change_rates
                                .insert(change.customer_type.clone(), change.rate)
                                .is_some()
                            {
                                return Err(ChainError::Config(format!(
                                    "day {n}: carryover for {:?} lists target {:?} twice",
                                    rec.customer_type, change.customer_type
                                )));
                            }
                        }
                        if map.insert(rec.customer_type.clone(), rule).is_some() {
                            return Err(ChainError::Config(format!(
                                "day {n}: duplicate carryover rule for {:?}",
                                rec.customer_type
                            )));
                        }
                    }
                    CarryoverShape::PerType(map)
                }
            };
            days.push(DaySpec {
                model,
                statistics_output: non_empty(record.statistics),
                carryover,
            });
        }

        let spec = ChainSpec {
            base_folder: PathBuf::from(non_empty(doc.base_folder).unwrap_or_else(|| ".".into())),
            days,
            day0_statistics: non_empty(doc.day0_statistics),
            initial_extra_arrivals: doc
                .initial_extra_arrivals
                .into_iter()
                .map(|r| ExtraArrival {
                    customer_type: r.customer_type,
                    count: r.count,
                })
                .collect(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn to_document(&self) -> ChainDocument {
        let days = self
            .days
            .iter()
            .map(|day| DayRecord {
                model: match &day.model {
                    ModelRef::Reuse => None,
                    ModelRef::Explicit(r) => Some(r.clone()),
                },
                statistics: day.statistics_output.clone(),
                carryover: Some(match &day.carryover {
                    CarryoverShape::Global(rule) => CarryoverTable::Global {
                        probability: rule.probability,
                    },
                    CarryoverShape::PerType(rules) => CarryoverTable::PerType {
                        rules: rules
                            .iter()
                            .map(|(source, rule)| CarryoverRecord {
                                customer_type: source.clone(),
                                probability: rule.probability,
                                type_changes: rule
                                    .type_change_rates
                                    .iter()
                                    .map(|(target, rate)| TypeChangeRecord {
                                        customer_type: target.clone(),
                                        rate: *rate,
                                    })
                                    .collect(),
                            })
                            .collect(),
                    },
                }),
            })
            .collect();

        ChainDocument {
            base_folder: Some(self.base_folder.to_string_lossy().into_owned()),
            day0_statistics: self.day0_statistics.clone(),
            initial_extra_arrivals: self
                .initial_extra_arrivals
                .iter()
                .map(|e| ExtraArrivalRecord {
                    customer_type: e.customer_type.clone(),
                    count: e.count,
                })
                .collect(),
            days,
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ChainError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ChainError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let doc: ChainDocument = serde_json::from_str(&raw).map_err(|e| {
            ChainError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;
        Self::from_document(doc)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ChainError> {
        let raw = serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| ChainError::Config(format!("cannot serialize chain: {e}")))?;
        fs::write(path, raw)
            .map_err(|e| ChainError::Config(format!("cannot write {}: {e}", path.display())))
    }

    /// Appends a day that reuses the previous model; returns its index.
    pub fn add_day(&mut self) -> usize {
        self.days.push(DaySpec::new(ModelRef::Reuse));
        self.days.len() - 1
    }

    pub fn remove_day(&mut self, index: usize) -> bool {
        if index >= self.days.len() {
            return false;
        }
        self.days.remove(index);
        true
    }

    pub fn move_day_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.days.len() {
            return false;
        }
        self.days.swap(index, index - 1);
        true
    }

    pub fn move_day_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.days.len() {
            return false;
        }
        self.days.swap(index, index + 1);
        true
    }

    /// Loads the saved statistics of every day of a finished chain.
    ///
    /// All days must have an output file and report the same customer types
    /// as day 1.
    pub fn load_results(&self, store: &dyn ChainStore) -> Result<Vec<Statistics>, ChainError> {
        if self.days.is_empty() {
            return Err(ChainError::Config("the chain has no days".to_string()));
        }
        let mut out: Vec<Statistics> = Vec::with_capacity(self.days.len());
        for (idx, day) in self.days.iter().enumerate() {
            let n = idx + 1;
            let Some(reference) = day.statistics_output.as_deref() else {
                return Err(ChainError::Config(format!(
                    "day {n} has no statistics output"
                )));
            };
            let path = self.resolve_path(reference);
            let stats = store.load_statistics(&path).map_err(|e| {
                ChainError::Config(format!("day {n}: {e}"))
            })?;
            if let Some(first) = out.first() {
                if first.type_names() != stats.type_names() {
                    return Err(ChainError::Config(format!(
                        "day {n}: customer types differ from day 1"
                    )));
                }
            }
            out.push(stats);
        }
        Ok(out)
    }
}
