//! Profile vocabulary shared by adapters, extractors and the correlator.
//!
//! Every source speaks in terms of [`ProfileField`] and [`FieldValue`], so
//! the correlator never inspects source-specific shapes.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a source adapter (e.g. `"directory"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Origin used for values copied from the query itself.
    pub const QUERY: &'static str = "query";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The pseudo-source for query-supplied values.
    pub fn query() -> Self {
        Self::new(Self::QUERY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A field of the correlated profile.
///
/// Scalar fields are reduced to one winning value; list fields are unioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Age,
    Location,
    Occupation,
    Relatives,
    Emails,
    Phones,
    Addresses,
    Usernames,
    Profiles,
}

impl ProfileField {
    /// Whether values are unioned instead of reduced to a winner.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            ProfileField::Relatives
                | ProfileField::Emails
                | ProfileField::Phones
                | ProfileField::Addresses
                | ProfileField::Usernames
                | ProfileField::Profiles
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Age => "age",
            ProfileField::Location => "location",
            ProfileField::Occupation => "occupation",
            ProfileField::Relatives => "relatives",
            ProfileField::Emails => "emails",
            ProfileField::Phones => "phones",
            ProfileField::Addresses => "addresses",
            ProfileField::Usernames => "usernames",
            ProfileField::Profiles => "profiles",
        }
    }

    /// Parse the field names used by AI backends and JSON sources.
    ///
    /// Accepts singular forms for list fields (`"email"` → `Emails`).
    pub fn parse(name: &str) -> Option<Self> {
        let field = match name.trim().to_lowercase().as_str() {
            "name" | "full_name" | "person_name" => ProfileField::Name,
            "age" => ProfileField::Age,
            "location" | "city" | "current_location" => ProfileField::Location,
            "occupation" | "job" | "job_title" => ProfileField::Occupation,
            "relative" | "relatives" => ProfileField::Relatives,
            "email" | "emails" => ProfileField::Emails,
            "phone" | "phones" | "phone_number" => ProfileField::Phones,
            "address" | "addresses" | "street_address" => ProfileField::Addresses,
            "username" | "usernames" => ProfileField::Usernames,
            "profile" | "profiles" | "url" => ProfileField::Profiles,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive age range. An exact age has `low == high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgeRange {
    pub low: u16,
    pub high: u16,
}

impl AgeRange {
    /// Oldest age we accept from any source.
    pub const MAX_AGE: u16 = 120;

    /// An exact age.
    pub fn exact(age: u16) -> Self {
        Self {
            low: age,
            high: age,
        }
    }

    /// A range; bounds are swapped if given in reverse.
    pub fn new(low: u16, high: u16) -> Self {
        Self {
            low: low.min(high),
            high: low.max(high),
        }
    }

    /// Parse `"34"`, `"30-34"` or `"30 to 34"`. Out-of-range ages are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let parts: Vec<&str> = text
            .split(|c: char| c == '-' || c == '–')
            .flat_map(|p| p.split(" to "))
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let range = match parts.as_slice() {
            [one] => Self::exact(one.parse().ok()?),
            [low, high] => Self::new(low.parse().ok()?, high.parse().ok()?),
            _ => return None,
        };

        (range.low > 0 && range.high <= Self::MAX_AGE).then_some(range)
    }

    pub fn overlaps(&self, other: &AgeRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }

    /// Width of the range in years.
    pub fn span(&self) -> u16 {
        self.high - self.low
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

/// A normalized value asserted for a [`ProfileField`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Age(AgeRange),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn age(age: u16) -> Self {
        FieldValue::Age(AgeRange::exact(age))
    }

    /// Build a value for `field` from raw source text.
    ///
    /// Ages must parse as an [`AgeRange`]; everything else must be non-blank.
    pub fn parse_for(field: ProfileField, raw: &str) -> Option<Self> {
        match field {
            ProfileField::Age => AgeRange::parse(raw).map(FieldValue::Age),
            _ => {
                let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                (!collapsed.is_empty()).then_some(FieldValue::Text(collapsed))
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Age(_) => None,
        }
    }

    pub fn as_age(&self) -> Option<AgeRange> {
        match self {
            FieldValue::Age(a) => Some(*a),
            FieldValue::Text(_) => None,
        }
    }

    /// Grouping key for string-valued fields.
    ///
    /// Case-insensitive and whitespace-insensitive for all text; phones keep
    /// only digits (dropping a leading US country code), profile URLs drop
    /// scheme and trailing slash, addresses drop punctuation.
    pub fn normalized(&self, field: ProfileField) -> String {
        match self {
            FieldValue::Age(age) => age.to_string(),
            FieldValue::Text(text) => normalize_text(field, text),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Age(age) => write!(f, "{}", age),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

fn normalize_text(field: ProfileField, text: &str) -> String {
    let base = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    match field {
        ProfileField::Phones => {
            let digits: String = base.chars().filter(|c| c.is_ascii_digit()).collect();
            match digits.strip_prefix('1') {
                Some(rest) if digits.len() == 11 => rest.to_string(),
                _ => digits,
            }
        }
        ProfileField::Profiles => base
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.")
            .trim_end_matches('/')
            .to_string(),
        ProfileField::Usernames => base.trim_start_matches('@').to_string(),
        ProfileField::Addresses => base
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        _ => base,
    }
}
