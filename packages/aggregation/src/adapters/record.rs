//! Wire shape for person records shared by the structured adapters.

use serde::{Deserialize, Serialize};

use crate::types::payload::SourceRecord;
use crate::types::profile::{FieldValue, ProfileField};
use crate::types::query::{Query, QueryField};

/// A person as stored in a directory file or returned by a JSON API.
///
/// Every field is optional; `age` accepts `34`, `"34"` or `"30-34"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient_age")]
    pub age: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usernames: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relatives: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<String>,
}

impl PersonRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Convert to a [`SourceRecord`]; unparseable values are dropped.
    pub fn to_source_record(&self, strength: f32) -> SourceRecord {
        let mut record = SourceRecord::new(strength);

        let scalars = [
            (ProfileField::Name, &self.name),
            (ProfileField::Age, &self.age),
            (ProfileField::Location, &self.location),
            (ProfileField::Occupation, &self.occupation),
        ];
        for (field, value) in scalars {
            if let Some(value) = value {
                record.push(field, value);
            }
        }

        let lists = [
            (ProfileField::Emails, &self.emails),
            (ProfileField::Phones, &self.phones),
            (ProfileField::Addresses, &self.addresses),
            (ProfileField::Usernames, &self.usernames),
            (ProfileField::Relatives, &self.relatives),
            (ProfileField::Profiles, &self.profiles),
        ];
        for (field, values) in lists {
            for value in values {
                record.push(field, value);
            }
        }

        record
    }

    /// Number of identifying query fields this record agrees with.
    ///
    /// Returns `None` when the query names a location the record contradicts.
    pub fn match_score(&self, query: &Query) -> Option<usize> {
        if let (Some(wanted), Some(have)) = (query.get(QueryField::Location), &self.location) {
            if !same(ProfileField::Location, wanted, have)
                && !have.to_lowercase().contains(&wanted.to_lowercase())
            {
                return None;
            }
        }

        let checks: [(QueryField, ProfileField, Vec<&String>); 5] = [
            (QueryField::Name, ProfileField::Name, self.name.iter().collect()),
            (QueryField::Email, ProfileField::Emails, self.emails.iter().collect()),
            (QueryField::Phone, ProfileField::Phones, self.phones.iter().collect()),
            (QueryField::Username, ProfileField::Usernames, self.usernames.iter().collect()),
            (QueryField::Address, ProfileField::Addresses, self.addresses.iter().collect()),
        ];

        let score = checks
            .into_iter()
            .filter(|(qf, pf, values)| {
                query
                    .get(*qf)
                    .is_some_and(|wanted| values.iter().any(|have| same(*pf, wanted, have)))
            })
            .count();

        Some(score)
    }
}

fn same(field: ProfileField, a: &str, b: &str) -> bool {
    FieldValue::text(a).normalized(field) == FieldValue::text(b).normalized(field)
}

/// Accept ages as numbers or strings.
mod lenient_age {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(age: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        match age {
            Some(age) => s.serialize_str(age),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        }))
    }
}
