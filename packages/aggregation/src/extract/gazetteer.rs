//! Known places for pattern-based location extraction.

/// Major US cities, most populous first.
pub const CITIES: &[&str] = &[
    "New York",
    "Los Angeles",
    "Chicago",
    "Houston",
    "Phoenix",
    "Philadelphia",
    "San Antonio",
    "San Diego",
    "Dallas",
    "Jacksonville",
    "Fort Worth",
    "San Jose",
    "Austin",
    "Charlotte",
    "Columbus",
    "Indianapolis",
    "San Francisco",
    "Seattle",
    "Denver",
    "Oklahoma City",
    "Nashville",
    "Washington",
    "El Paso",
    "Las Vegas",
    "Boston",
    "Detroit",
    "Portland",
    "Louisville",
    "Memphis",
    "Baltimore",
    "Milwaukee",
    "Albuquerque",
    "Tucson",
    "Fresno",
    "Sacramento",
    "Mesa",
    "Atlanta",
    "Kansas City",
    "Colorado Springs",
    "Omaha",
    "Raleigh",
    "Miami",
    "Virginia Beach",
    "Long Beach",
    "Oakland",
    "Minneapolis",
    "Saint Paul",
    "Tulsa",
    "Bakersfield",
    "Tampa",
    "Arlington",
    "Wichita",
    "Aurora",
    "New Orleans",
    "Cleveland",
    "Honolulu",
    "Anaheim",
    "Orlando",
    "Pittsburgh",
    "Cincinnati",
    "St. Louis",
    "Salt Lake City",
    "Buffalo",
    "Boise",
    "Spokane",
    "Anchorage",
    "Madison",
    "Richmond",
    "Des Moines",
    "Duluth",
    "Rochester",
];

/// US states by full name.
pub const STATES: &[&str] = &[
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

/// Check whether `phrase` names a known city or state (case-insensitive).
pub fn is_place(phrase: &str) -> bool {
    let phrase = phrase.trim();
    CITIES
        .iter()
        .chain(STATES.iter())
        .any(|p| p.eq_ignore_ascii_case(phrase))
}

/// Known city that `phrase` starts with, longest match first.
///
/// `"Austin Texas"` → `Some("Austin")`.
pub fn city_prefix(phrase: &str) -> Option<&'static str> {
    CITIES
        .iter()
        .filter(|city| {
            phrase.starts_with(**city)
                && phrase[city.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_alphanumeric())
        })
        .max_by_key(|city| city.len())
        .copied()
}

/// Earliest whole-word occurrence of any entry of `places` in `text`.
///
/// Matching is case-sensitive: place names are proper nouns. Returns the
/// byte offset and the canonical entry.
pub fn find_first(text: &str, places: &[&'static str]) -> Option<(usize, &'static str)> {
    places
        .iter()
        .filter_map(|place| {
            text.match_indices(*place)
                .find(|(idx, _)| is_word_boundary(text, *idx, place.len()))
                .map(|(idx, _)| (idx, *place))
        })
        // Earliest wins; at the same offset the longer name ("New York" over "York")
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())))
}

fn is_word_boundary(text: &str, start: usize, len: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[start + len..].chars().next();
    before.map_or(true, |c| !c.is_alphanumeric()) && after.map_or(true, |c| !c.is_alphanumeric())
}
