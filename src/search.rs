//! University search.
//!
//! A university matches a term when its own name, its location's name, the
//! degree name of any of its courses, or the name of any of its courses
//! contains the term, ignoring case.

/// Names a university can be found by.
#[derive(Debug, Default)]
pub struct SearchFields<'a> {
    pub name: &'a str,
    pub location: Option<&'a str>,
    pub degrees: Vec<&'a str>,
    pub courses: Vec<&'a str>,
}

/// Normalizes a raw `search` query value. Blank terms mean "no filter".
pub fn normalize_term(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Returns `true` if any searchable field contains `term_lower`.
///
/// `term_lower` must already be lowercased, see [`normalize_term`].
pub fn matches(fields: &SearchFields<'_>, term_lower: &str) -> bool {
    contains(fields.name, term_lower)
        || fields.location.is_some_and(|l| contains(l, term_lower))
        || fields.degrees.iter().any(|d| contains(d, term_lower))
        || fields.courses.iter().any(|c| contains(c, term_lower))
}
