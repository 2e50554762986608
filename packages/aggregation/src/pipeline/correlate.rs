//! Correlation: many assertions in, one profile out.
//!
//! Scalar fields are resolved to one winning value per field:
//!
//! 1. Assertions are grouped by normalized value (overlapping ranges for age).
//! 2. Each group scores `Σ strength × ln(1 + distinct sources)`, counting
//!    only the strongest assertion of each source.
//! 3. The best group wins with confidence `score / Σ scores`. A field backed
//!    by a single source reports that source's raw strength instead.
//! 4. Equal scores go to the group with the most recent `fetched_at`, then
//!    to the smallest normalized value.
//!
//! List fields are unioned; each entry keeps its own source set.
//!
//! The result depends only on the set of assertions, never on their order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::entity::ExtractedEntity;
use crate::types::payload::SourceRecord;
use crate::types::profile::{AgeRange, FieldValue, ProfileField, SourceId};
use crate::types::query::{Query, QueryField};

/// One (field, value, origin, strength) claim.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssertion {
    pub field: ProfileField,
    pub value: FieldValue,
    pub source: SourceId,
    pub strength: f32,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl FieldAssertion {
    pub fn new(
        field: ProfileField,
        value: FieldValue,
        source: impl Into<SourceId>,
        strength: f32,
    ) -> Self {
        Self {
            field,
            value,
            source: source.into(),
            strength: strength.clamp(0.0, 1.0),
            fetched_at: None,
        }
    }

    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }

    /// Assertions for every entry of a structured record.
    pub fn from_record(
        source: &SourceId,
        record: &SourceRecord,
        fetched_at: Option<DateTime<Utc>>,
    ) -> Vec<Self> {
        record
            .entries
            .iter()
            .map(|entry| Self {
                field: entry.field,
                value: entry.value.clone(),
                source: source.clone(),
                strength: record.strength,
                fetched_at,
            })
            .collect()
    }

    /// Assertions for entities extracted from a source's text.
    pub fn from_entities(
        source: &SourceId,
        entities: &[ExtractedEntity],
        fetched_at: Option<DateTime<Utc>>,
    ) -> Vec<Self> {
        entities
            .iter()
            .map(|entity| Self {
                field: entity.field,
                value: entity.value.clone(),
                source: source.clone(),
                strength: entity.strength,
                fetched_at,
            })
            .collect()
    }

    fn key(&self) -> String {
        self.value.normalized(self.field)
    }
}

/// A candidate group that lost to the winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub value: FieldValue,
    pub score: f64,
    pub sources: BTreeSet<SourceId>,
}

/// The resolved value of a scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub value: FieldValue,

    /// 0.0 to 1.0
    pub confidence: f64,

    /// Never empty.
    pub contributing_sources: BTreeSet<SourceId>,

    /// Losing groups, best first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<Alternative>,
}

/// One value of a list field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub value: FieldValue,
    pub sources: BTreeSet<SourceId>,
}

/// The merged profile for one run.
///
/// Fields nobody asserted are absent, not empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedProfile {
    pub fields: BTreeMap<ProfileField, ResolvedField>,
    pub lists: BTreeMap<ProfileField, Vec<ListEntry>>,
}

impl CorrelatedProfile {
    pub fn get(&self, field: ProfileField) -> Option<&ResolvedField> {
        self.fields.get(&field)
    }

    pub fn list(&self, field: ProfileField) -> &[ListEntry] {
        self.lists.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the field is present at all, scalar or list.
    pub fn contains(&self, field: ProfileField) -> bool {
        self.fields.contains_key(&field) || self.lists.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.lists.is_empty()
    }

    /// Fill fields the query supplied but no source asserted.
    ///
    /// Seeded values carry confidence 0.0 and the `query` pseudo-source; they
    /// never override or corroborate source data.
    pub fn seed_from_query(&mut self, query: &Query) {
        let seeds = [
            (QueryField::Name, ProfileField::Name),
            (QueryField::Location, ProfileField::Location),
            (QueryField::Email, ProfileField::Emails),
            (QueryField::Phone, ProfileField::Phones),
            (QueryField::Username, ProfileField::Usernames),
            (QueryField::Address, ProfileField::Addresses),
        ];

        for (query_field, field) in seeds {
            if self.contains(field) {
                continue;
            }
            let Some(value) = query
                .get(query_field)
                .and_then(|raw| FieldValue::parse_for(field, raw))
            else {
                continue;
            };

            let sources = BTreeSet::from([SourceId::query()]);
            if field.is_list() {
                self.lists.insert(field, vec![ListEntry { value, sources }]);
            } else {
                self.fields.insert(
                    field,
                    ResolvedField {
                        value,
                        confidence: 0.0,
                        contributing_sources: sources,
                        alternatives: Vec::new(),
                    },
                );
            }
        }
    }
}

/// A group of assertions that agree on one value.
struct Group<'a> {
    key: String,
    members: Vec<&'a FieldAssertion>,
}

impl<'a> Group<'a> {
    /// Strongest assertion per source.
    fn per_source(&self) -> BTreeMap<&'a SourceId, f32> {
        let mut best: BTreeMap<&SourceId, f32> = BTreeMap::new();
        for a in self.members.iter().copied() {
            let entry = best.entry(&a.source).or_insert(0.0);
            *entry = entry.max(a.strength);
        }
        best
    }

    fn score(&self) -> f64 {
        let per_source = self.per_source();
        let sum: f64 = per_source.values().map(|s| f64::from(*s)).sum();
        sum * (1.0 + per_source.len() as f64).ln()
    }

    fn max_strength(&self) -> f32 {
        self.members.iter().map(|a| a.strength).fold(0.0, f32::max)
    }

    fn latest(&self) -> Option<DateTime<Utc>> {
        self.members.iter().filter_map(|a| a.fetched_at).max()
    }

    fn sources(&self) -> BTreeSet<SourceId> {
        self.members.iter().map(|a| a.source.clone()).collect()
    }

    /// Strongest, then most recent, then narrowest, then smallest value.
    fn representative(&self) -> &'a FieldAssertion {
        let mut members = self.members.clone();
        members.sort_by(|a, b| rank(b, a));
        members[0]
    }
}

/// Ordering where greater means a better representative.
fn rank(a: &FieldAssertion, b: &FieldAssertion) -> Ordering {
    let span = |x: &FieldAssertion| x.value.as_age().map_or(0, |r| r.span());
    a.strength
        .total_cmp(&b.strength)
        .then(a.fetched_at.cmp(&b.fetched_at))
        .then(span(b).cmp(&span(a)))
        .then(b.value.cmp(&a.value))
        .then(b.source.cmp(&a.source))
}

/// Merges assertions into a [`CorrelatedProfile`].
#[derive(Debug, Clone, Default)]
pub struct Correlator;

impl Correlator {
    pub fn new() -> Self {
        Self
    }

    pub fn correlate(&self, assertions: &[FieldAssertion]) -> CorrelatedProfile {
        let mut by_field: BTreeMap<ProfileField, Vec<&FieldAssertion>> = BTreeMap::new();
        for a in assertions {
            by_field.entry(a.field).or_default().push(a);
        }

        let mut profile = CorrelatedProfile::default();
        for (field, assertions) in by_field {
            if field.is_list() {
                profile.lists.insert(field, union(&assertions));
            } else if let Some(resolved) = resolve(field, &assertions) {
                profile.fields.insert(field, resolved);
            }
        }
        profile
    }
}

fn resolve(field: ProfileField, assertions: &[&FieldAssertion]) -> Option<ResolvedField> {
    let mut groups = if field == ProfileField::Age {
        group_ages(assertions)
    } else {
        group_by_key(assertions)
    };
    if groups.is_empty() {
        return None;
    }

    let scored: Vec<f64> = groups.iter().map(Group::score).collect();
    let total: f64 = scored.iter().sum();

    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by(|&a, &b| {
        scored[b]
            .total_cmp(&scored[a])
            .then(groups[b].latest().cmp(&groups[a].latest()))
            .then(groups[a].key.cmp(&groups[b].key))
    });

    let winner_idx = order[0];
    let distinct_sources: BTreeSet<&SourceId> = assertions.iter().map(|a| &a.source).collect();

    let winner = &groups[winner_idx];
    let confidence = if distinct_sources.len() == 1 {
        f64::from(winner.max_strength())
    } else if total > 0.0 {
        (scored[winner_idx] / total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let alternatives = order[1..]
        .iter()
        .map(|&i| Alternative {
            value: groups[i].representative().value.clone(),
            score: scored[i],
            sources: groups[i].sources(),
        })
        .collect();

    let winner = groups.swap_remove(winner_idx);
    Some(ResolvedField {
        value: winner.representative().value.clone(),
        confidence,
        contributing_sources: winner.sources(),
        alternatives,
    })
}

fn group_by_key<'a>(assertions: &[&'a FieldAssertion]) -> Vec<Group<'a>> {
    let mut groups: BTreeMap<String, Vec<&FieldAssertion>> = BTreeMap::new();
    for &a in assertions {
        groups.entry(a.key()).or_default().push(a);
    }
    groups
        .into_iter()
        .map(|(key, members)| Group { key, members })
        .collect()
}

/// Merge overlapping age ranges into groups.
fn group_ages<'a>(assertions: &[&'a FieldAssertion]) -> Vec<Group<'a>> {
    let mut ages: Vec<(&FieldAssertion, AgeRange)> = assertions
        .iter()
        .filter_map(|a| a.value.as_age().map(|r| (*a, r)))
        .collect();
    ages.sort_by_key(|(_, r)| (r.low, r.high));

    let mut groups: Vec<Group> = Vec::new();
    let mut reach = 0u16;
    for (a, range) in ages {
        match groups.last_mut() {
            Some(group) if range.low <= reach => {
                group.members.push(a);
                reach = reach.max(range.high);
            }
            _ => {
                groups.push(Group {
                    key: String::new(),
                    members: vec![a],
                });
                reach = range.high;
            }
        }
    }

    for group in &mut groups {
        let low = group.members.iter().filter_map(|a| a.value.as_age()).map(|r| r.low).min();
        let high = group.members.iter().filter_map(|a| a.value.as_age()).map(|r| r.high).max();
        if let (Some(low), Some(high)) = (low, high) {
            group.key = format!("{:03}-{:03}", low, high);
        }
    }
    groups
}

fn union(assertions: &[&FieldAssertion]) -> Vec<ListEntry> {
    let groups = group_by_key(assertions);
    let mut entries: Vec<(String, ListEntry)> = groups
        .into_iter()
        .map(|group| {
            let entry = ListEntry {
                value: group.representative().value.clone(),
                sources: group.sources(),
            };
            (group.key, entry)
        })
        .collect();

    entries.sort_by(|(ka, a), (kb, b)| b.sources.len().cmp(&a.sources.len()).then(ka.cmp(kb)));
    entries.into_iter().map(|(_, entry)| entry).collect()
}
