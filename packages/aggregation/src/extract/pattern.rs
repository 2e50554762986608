//! Deterministic pattern-based entity extraction.
//!
//! Capitalized-word runs for names, "NN years old" style phrases for ages,
//! and a gazetteer for locations. Every entity is capped at the configured
//! pattern strength; secondary name candidates get half of it.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

use crate::extract::gazetteer;
use crate::traits::extractor::EntityExtractor;
use crate::types::entity::{ExtractedEntity, Extraction, ExtractionMethod};
use crate::types::profile::ProfileField;

/// Maximum name candidates taken from one text.
const MAX_NAMES: usize = 5;

lazy_static! {
    // One to three capitalized words; "O'Brien", "McDonald", "García-López"
    static ref NAME_REGEX: Regex = Regex::new(
        r"\b\p{Lu}[\p{Ll}'’-]*(?:\p{Lu}\p{Ll}+)?(?:[ \t]+\p{Lu}[\p{Ll}'’-]*(?:\p{Lu}\p{Ll}+)?){1,2}\b"
    ).unwrap();

    static ref AGE_RANGE_REGEX: Regex =
        Regex::new(r"(?i)\bage[sd]?\s*:?\s*(\d{1,3})\s*(?:-|–|to)\s*(\d{1,3})\b").unwrap();

    static ref AGE_YEARS_REGEX: Regex =
        Regex::new(r"(?i)\b(\d{1,3})[\s-]*(?:years?|yrs?)[\s-]*old\b").unwrap();

    static ref AGE_YO_REGEX: Regex = Regex::new(r"(?i)\b(\d{1,3})\s*y/?o\b").unwrap();

    static ref AGE_LABEL_REGEX: Regex =
        Regex::new(r"(?i)\bage[sd]?\s*:?\s*(\d{1,3})\b").unwrap();

    // "Jane Doe, 29, Seattle"
    static ref AGE_AFTER_NAME_REGEX: Regex =
        Regex::new(r"(?m)\p{L},\s*(\d{1,3})\s*(?:,|;|\.|$)").unwrap();

    static ref LIVES_IN_REGEX: Regex = Regex::new(
        r"\b(?:[Ll]ives|[Ll]iving|[Rr]esides|[Bb]ased|[Ll]ocated|[Mm]oved)\s+(?:in|to)\s+(\p{Lu}[\p{L}.]*(?:\s+\p{Lu}[\p{L}.]*)*)"
    ).unwrap();

    static ref OCCUPATION_REGEX: Regex = Regex::new(
        r"(?i)\b(?:works|worked|working|employed)\s+as\s+(?:an?\s+)?([a-z][a-z \-]{2,40}?)(?:\s+(?:at|for|in|with)\b|[.,;\n]|$)"
    ).unwrap();

    static ref RELATIVES_REGEX: Regex = Regex::new(
        r"(?i)\b(?:relatives?|related\s+to|family(?:\s+members)?)\s*:?\s*([^.;\n]+)"
    ).unwrap();

    // Same shapes as the PII detector uses
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").unwrap();

    static ref PHONE_REGEX: Regex =
        Regex::new(r"(?:\+?1[-.\s]?)?\(?\b([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b").unwrap();

    /// Profile pages on well-known social and developer sites.
    static ref PROFILE_URL_REGEX: Regex = Regex::new(
        r#"(?i)\bhttps?://(?:(?:www|m|[a-z]{2})\.)?(?:linkedin\.com|facebook\.com|twitter\.com|x\.com|instagram\.com|github\.com|tiktok\.com|youtube\.com|reddit\.com|medium\.com)/[^\s<>()\[\]{}"']+"#
    ).unwrap();

    /// Leading words that make a capitalized run a sentence start, not a name.
    static ref NAME_STOPWORDS: HashSet<&'static str> = [
        "The", "This", "That", "A", "An", "And", "But", "Or", "Of", "In", "On", "At",
        "Age", "Aged", "Lives", "Living", "Born", "Contact", "Call", "Email", "Phone",
        "Mr", "Mrs", "Ms", "Dr", "Meet", "About", "Profile", "Relatives", "Related",
        "Works", "Worked", "Street", "Avenue", "Road", "Apt", "Suite",
        "January", "February", "March", "April", "May", "June", "July", "August",
        "September", "October", "November", "December",
        "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
    ]
    .into_iter()
    .collect();
}

/// Pattern-based extractor.
///
/// Pure: the same text always yields the same entities in the same order.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    strength: f32,
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl PatternExtractor {
    /// Create an extractor whose entities are capped at `strength`.
    pub fn new(strength: f32) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Run every rule over `text`.
    pub fn extract_entities(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();
        let relatives_span = RELATIVES_REGEX
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.range());

        entities.extend(self.names(text, relatives_span.clone()));
        entities.extend(self.age(text));
        entities.extend(self.location(text));
        entities.extend(self.occupation(text));
        if let Some(span) = relatives_span {
            entities.extend(self.relatives(&text[span]));
        }
        entities.extend(self.contacts(text));
        entities
    }

    fn names(&self, text: &str, skip: Option<Range<usize>>) -> Vec<ExtractedEntity> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for mat in NAME_REGEX.find_iter(text) {
            if skip.as_ref().is_some_and(|s| s.contains(&mat.start())) {
                continue;
            }
            let Some(candidate) = clean_name(mat.as_str()) else {
                continue;
            };
            if seen.insert(candidate.to_lowercase()) {
                names.push(candidate);
            }
            if names.len() == MAX_NAMES {
                break;
            }
        }

        names
            .into_iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let strength = if i == 0 { self.strength } else { self.strength / 2.0 };
                ExtractedEntity::parse(ProfileField::Name, &name, strength)
            })
            .collect()
    }

    fn age(&self, text: &str) -> Option<ExtractedEntity> {
        let ranges = AGE_RANGE_REGEX
            .captures_iter(text)
            .map(|c| format!("{}-{}", &c[1], &c[2]));

        let singles = [
            &*AGE_YEARS_REGEX,
            &*AGE_YO_REGEX,
            &*AGE_LABEL_REGEX,
            &*AGE_AFTER_NAME_REGEX,
        ]
        .into_iter()
        .flat_map(|re| re.captures_iter(text).map(|c| c[1].to_string()));

        // A rejected capture ("150 years old") falls through to the next one
        ranges
            .chain(singles)
            .find_map(|raw| ExtractedEntity::parse(ProfileField::Age, &raw, self.strength))
    }

    fn location(&self, text: &str) -> Option<ExtractedEntity> {
        let stated = LIVES_IN_REGEX
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .find_map(|m| gazetteer::city_prefix(m.as_str()));

        let place = stated
            .or_else(|| gazetteer::find_first(text, gazetteer::CITIES).map(|(_, c)| c))
            .or_else(|| gazetteer::find_first(text, gazetteer::STATES).map(|(_, s)| s))?;

        ExtractedEntity::parse(ProfileField::Location, place, self.strength)
    }

    fn occupation(&self, text: &str) -> Option<ExtractedEntity> {
        let caps = OCCUPATION_REGEX.captures(text)?;
        ExtractedEntity::parse(ProfileField::Occupation, caps[1].trim(), self.strength)
    }

    fn relatives(&self, segment: &str) -> Vec<ExtractedEntity> {
        NAME_REGEX
            .find_iter(segment)
            .filter_map(|m| clean_name(m.as_str()))
            .filter_map(|name| {
                ExtractedEntity::parse(ProfileField::Relatives, &name, self.strength)
            })
            .collect()
    }

    fn contacts(&self, text: &str) -> Vec<ExtractedEntity> {
        let emails = EMAIL_REGEX.find_iter(text).filter_map(|m| {
            ExtractedEntity::parse(ProfileField::Emails, m.as_str(), self.strength)
        });

        let phones = PHONE_REGEX.find_iter(text).filter_map(|m| {
            ExtractedEntity::parse(ProfileField::Phones, m.as_str(), self.strength)
        });

        let profiles = PROFILE_URL_REGEX.find_iter(text).filter_map(|m| {
            let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
            ExtractedEntity::parse(ProfileField::Profiles, url, self.strength)
        });

        emails.chain(phones).chain(profiles).collect()
    }
}

#[async_trait]
impl EntityExtractor for PatternExtractor {
    async fn extract(&self, text: &str) -> Extraction {
        Extraction::new(self.extract_entities(text), ExtractionMethod::Pattern)
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

/// Strip stopword prefixes and possessives, reject places; names need two or more words.
fn clean_name(candidate: &str) -> Option<String> {
    let words: Vec<&str> = candidate
        .split_whitespace()
        .skip_while(|w| NAME_STOPWORDS.contains(w))
        .collect();

    if words.len() < 2 || words.iter().any(|w| NAME_STOPWORDS.contains(w)) {
        return None;
    }

    let joined = words.join(" ");
    let name = joined
        .strip_suffix("'s")
        .or_else(|| joined.strip_suffix("’s"))
        .unwrap_or(&joined)
        .trim_end_matches(['\'', '’', '-'])
        .to_string();
    if gazetteer::is_place(&name) || gazetteer::city_prefix(&name).is_some() {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::{AgeRange, FieldValue};

    fn values(entities: &[ExtractedEntity], field: ProfileField) -> Vec<String> {
        entities
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.value.to_string())
            .collect()
    }

    #[test]
    fn test_name_age_location_sentence() {
        let entities = PatternExtractor::default()
            .extract_entities("John Smith, 34 years old, lives in Austin");

        assert_eq!(values(&entities, ProfileField::Name), vec!["John Smith"]);
        assert_eq!(values(&entities, ProfileField::Age), vec!["34"]);
        assert_eq!(values(&entities, ProfileField::Location), vec!["Austin"]);
        assert!(entities.iter().all(|e| e.strength <= 0.5));
    }

    #[test]
    fn test_bare_age_after_name() {
        let entities = PatternExtractor::default().extract_entities("Jane Doe, 29, Seattle");

        assert_eq!(values(&entities, ProfileField::Name), vec!["Jane Doe"]);
        let age = entities.iter().find(|e| e.field == ProfileField::Age).unwrap();
        assert_eq!(age.value, FieldValue::Age(AgeRange::exact(29)));
        assert_eq!(values(&entities, ProfileField::Location), vec!["Seattle"]);
    }

    #[test]
    fn test_age_range_label() {
        let entities = PatternExtractor::default().extract_entities("Jane Doe, Age 30-34");
        let age = entities.iter().find(|e| e.field == ProfileField::Age).unwrap();
        assert_eq!(age.value, FieldValue::Age(AgeRange::new(30, 34)));
    }

    #[test]
    fn test_stated_residence_beats_first_mention() {
        let entities = PatternExtractor::default()
            .extract_entities("Mark Twain was born in Dallas and now lives in Denver.");
        assert_eq!(values(&entities, ProfileField::Location), vec!["Denver"]);
    }

    #[test]
    fn test_places_are_not_names() {
        let entities =
            PatternExtractor::default().extract_entities("Trips to New York and Salt Lake City");
        assert!(values(&entities, ProfileField::Name).is_empty());
        assert_eq!(values(&entities, ProfileField::Location), vec!["New York"]);
    }

    #[test]
    fn test_secondary_names_are_weaker() {
        let entities = PatternExtractor::new(0.4)
            .extract_entities("Jane Doe met Richard Roe at the office.");
        let names: Vec<_> = entities
            .iter()
            .filter(|e| e.field == ProfileField::Name)
            .collect();

        assert_eq!(names.len(), 2);
        assert_eq!(names[0].strength, 0.4);
        assert_eq!(names[1].strength, 0.2);
    }

    #[test]
    fn test_relatives_and_contacts() {
        let text = "Jane Doe, 29. Relatives: Mary Doe, Peter Doe. \
                    Reach her at jane.doe@example.com or (206) 555-0100.";
        let entities = PatternExtractor::default().extract_entities(text);

        assert_eq!(values(&entities, ProfileField::Name), vec!["Jane Doe"]);
        assert_eq!(
            values(&entities, ProfileField::Relatives),
            vec!["Mary Doe", "Peter Doe"]
        );
        assert_eq!(
            values(&entities, ProfileField::Emails),
            vec!["jane.doe@example.com"]
        );
        assert_eq!(values(&entities, ProfileField::Phones), vec!["(206) 555-0100"]);
    }

    #[test]
    fn test_occupation() {
        let entities = PatternExtractor::default()
            .extract_entities("Jane Doe works as a software engineer at Initech.");
        assert_eq!(
            values(&entities, ProfileField::Occupation),
            vec!["software engineer"]
        );
    }

    #[test]
    fn test_deterministic() {
        let extractor = PatternExtractor::default();
        let text = "Jane Doe, 29, Seattle. Email jane@example.com";
        assert_eq!(
            extractor.extract_entities(text),
            extractor.extract_entities(text)
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(PatternExtractor::default().extract_entities("").is_empty());
    }

    #[test]
    fn test_non_ascii_names() {
        let entities = PatternExtractor::default()
            .extract_entities("José García, 41 years old, lives in Austin");

        assert_eq!(values(&entities, ProfileField::Name), vec!["José García"]);
        assert_eq!(values(&entities, ProfileField::Age), vec!["41"]);
        assert_eq!(values(&entities, ProfileField::Location), vec!["Austin"]);
    }

    #[test]
    fn test_prefixed_and_apostrophe_names() {
        let entities = PatternExtractor::default()
            .extract_entities("John McDonald met Mary O'Brien at Jean-Luc Picard's house.");

        assert_eq!(
            values(&entities, ProfileField::Name),
            vec!["John McDonald", "Mary O'Brien", "Jean-Luc Picard"]
        );
    }

    #[test]
    fn test_rejected_age_falls_through() {
        let entities = PatternExtractor::default()
            .extract_entities("Jane Doe claims to be 150 years old. Age: 34");

        let age = entities.iter().find(|e| e.field == ProfileField::Age).unwrap();
        assert_eq!(age.value, FieldValue::Age(AgeRange::exact(34)));
    }

    #[test]
    fn test_profile_urls() {
        let text = "Jane Doe - LinkedIn\nhttps://www.linkedin.com/in/jane-doe.\n\n\
                    Jane Doe (@jdoe) on GitHub: https://github.com/jdoe\n\n\
                    https://example.com/news/jane-doe";
        let entities = PatternExtractor::default().extract_entities(text);

        assert_eq!(
            values(&entities, ProfileField::Profiles),
            vec!["https://www.linkedin.com/in/jane-doe", "https://github.com/jdoe"]
        );
    }
}
