//! Department and responsible-person normalization.
//!
//! Source spelling varies a lot between rows: extra spaces, the hamza forms
//! of alef, titles in front of names, several people in one cell. Both
//! normalizers fold these away and then match loosely against the
//! hand-maintained allow-lists in [`PipelineConfig`].

use std::sync::OnceLock;

use regex::Regex;

use crate::PipelineConfig;

/// Separators between several names in one responsible cell
const NAME_SEPARATORS: [char; 4] = ['+', '،', ',', '/'];

/// Leading one-letter title (أ, م, د) followed by a period or a space
fn title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[أمد](?:\.|\s)").expect("static pattern"))
}

/// Fold `أ` and `إ` to the bare alef `ا`
pub fn fold_alef(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'أ' | 'إ' => 'ا',
            other => other,
        })
        .collect()
}

/// Trim and collapse every whitespace run to a single space
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a department name
pub fn normalize_department(raw: &str) -> String {
    fold_alef(&collapse_whitespace(raw))
}

/// Canonical form of one candidate person name, title stripped
pub fn clean_person_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let untitled = title_pattern().replace(trimmed, "");
    fold_alef(&collapse_whitespace(&untitled))
}

/// Split a responsible cell into cleaned candidate names.
///
/// Empty candidates and the placeholder are dropped.
pub fn split_responsible(raw: &str, placeholder: &str) -> Vec<String> {
    raw.split(NAME_SEPARATORS)
        .map(clean_person_name)
        .filter(|name| !name.is_empty() && name != placeholder)
        .collect()
}

/// Matches departments and people against the configured allow-lists
#[derive(Clone, Debug)]
pub struct EntityNormalizer {
    placeholder: String,
    /// (canonical, folded)
    departments: Vec<(String, String)>,
    /// (canonical, folded name parts)
    people: Vec<(String, Vec<String>)>,
}

impl EntityNormalizer {
    pub fn new(config: &PipelineConfig) -> Self {
        let departments = config
            .departments
            .iter()
            .map(|d| (d.clone(), normalize_department(d)))
            .filter(|(_, folded)| !folded.is_empty())
            .collect();
        let people = config
            .people
            .iter()
            .map(|p| {
                let parts: Vec<String> = fold_alef(p).split_whitespace().map(String::from).collect();
                (p.clone(), parts)
            })
            .filter(|(_, parts)| !parts.is_empty())
            .collect();
        Self {
            placeholder: config.markers.placeholder.clone(),
            departments,
            people,
        }
    }

    /// Normalized department if it matches the allow-list.
    ///
    /// A name matches an allowed department when it contains the allowed
    /// name's first word, or when the allowed name contains it.
    pub fn recognized_department(&self, raw: &str) -> Option<String> {
        let name = normalize_department(raw);
        if name.is_empty() || name == self.placeholder {
            return None;
        }
        let known = self.departments.iter().any(|(_, allowed)| {
            let first_word = allowed.split(' ').next().unwrap_or(allowed);
            name.contains(first_word) || allowed.contains(&name)
        });
        known.then_some(name)
    }

    /// Canonical allow-listed name for one cleaned candidate.
    ///
    /// Every part of the allowed name must occur somewhere in the candidate,
    /// in any order. The first allowed name that matches wins.
    pub fn match_person(&self, candidate: &str) -> Option<&str> {
        let candidate = fold_alef(&collapse_whitespace(candidate));
        if candidate.is_empty() {
            return None;
        }
        self.people
            .iter()
            .find(|(_, parts)| parts.iter().all(|part| candidate.contains(part.as_str())))
            .map(|(canonical, _)| canonical.as_str())
    }

    /// Canonical names of every recognised person in a responsible cell
    pub fn recognized_people(&self, raw: &str) -> Vec<&str> {
        let mut found: Vec<&str> = Vec::new();
        for candidate in split_responsible(raw, &self.placeholder) {
            if let Some(name) = self.match_person(&candidate) {
                if !found.contains(&name) {
                    found.push(name);
                }
            }
        }
        found
    }

    /// Responsible filter: some candidate contains the query or is contained by it
    pub fn responsible_matches(&self, raw: &str, query: &str) -> bool {
        let query = clean_person_name(query);
        if query.is_empty() {
            return true;
        }
        split_responsible(raw, &self.placeholder)
            .iter()
            .any(|name| name.contains(&query) || query.contains(name.as_str()))
    }
}
