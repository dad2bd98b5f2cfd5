//! Unranked keyword matching of careers by category, related skills and name.
//!
//! Every operation is a linear scan of the catalog. Results keep catalog order.
//! A needle that normalizes to nothing (say `"&&"`) is the empty string and so
//! matches every career; only blank fields are skipped by `search`.

use std::collections::HashSet;

use serde::Deserialize;

use crate::matching::normalize::normalize_text;
use crate::models::CareerRecord;

/// The three optional fields a keyword search may carry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordQuery {
    #[serde(default)]
    pub interest: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
}

/// Careers whose normalized category contains the normalized interest.
pub fn match_interest<'a>(catalog: &'a [CareerRecord], interest: &str) -> Vec<&'a CareerRecord> {
    let needle = normalize_text(interest);
    catalog
        .iter()
        .filter(|c| normalize_text(&c.category).contains(&needle))
        .collect()
}

/// Careers with at least one related skill equal (case-insensitively) to one
/// of the comma-separated skills. Exact token match, not substring.
pub fn match_skills<'a>(catalog: &'a [CareerRecord], skills: &str) -> Vec<&'a CareerRecord> {
    let wanted = split_skills(skills);
    if wanted.is_empty() {
        return Vec::new();
    }
    catalog
        .iter()
        .filter(|c| {
            c.related_skills
                .iter()
                .any(|s| wanted.contains(&s.to_lowercase()))
        })
        .collect()
}

/// Careers whose normalized name contains the normalized job title.
pub fn match_job<'a>(catalog: &'a [CareerRecord], job: &str) -> Vec<&'a CareerRecord> {
    let needle = normalize_text(job);
    catalog
        .iter()
        .filter(|c| normalize_text(&c.name).contains(&needle))
        .collect()
}

/// Runs the operations for each non-blank field (interest, then skills, then
/// job), concatenates the hits, and keeps the first record seen per name.
pub fn search<'a>(catalog: &'a [CareerRecord], query: &KeywordQuery) -> Vec<&'a CareerRecord> {
    let mut hits = Vec::new();

    if let Some(interest) = non_blank(&query.interest) {
        hits.extend(match_interest(catalog, interest));
    }
    if let Some(skills) = non_blank(&query.skills) {
        hits.extend(match_skills(catalog, skills));
    }
    if let Some(job) = non_blank(&query.job) {
        hits.extend(match_job(catalog, job));
    }

    dedup_by_name(hits)
}

/// Keeps the first occurrence of every career name.
pub fn dedup_by_name(records: Vec<&CareerRecord>) -> Vec<&CareerRecord> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.name.as_str()) {
            unique.push(record);
        }
    }
    unique
}

fn split_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}
