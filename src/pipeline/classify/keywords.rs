//! Keyword-scoring strategy: count catalog keyword hits per GL code.

use std::collections::{BTreeMap, HashSet};

use super::types::Candidate;
use crate::catalog::CatalogSnapshot;
use crate::config::ClassifierConfig;
use crate::models::ClassificationMethod;

/// Single-token keywords must match a whole token; "paid" inside
/// "unpaid" is not a hit. Multi-word or punctuated keywords match as
/// substrings of the lowercased text.
fn keyword_matches(keyword: &str, lower_text: &str, tokens: &HashSet<&str>) -> bool {
    if keyword.chars().any(|c| !c.is_alphanumeric()) {
        lower_text.contains(keyword)
    } else {
        tokens.contains(keyword)
    }
}

pub(crate) fn keyword_candidate(
    snapshot: &CatalogSnapshot,
    text: &str,
    config: &ClassifierConfig,
) -> Option<Candidate> {
    if text.trim().is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    let tokens: HashSet<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    // BTreeMap keyed by code keeps tallies in code order, which makes the
    // tie-break below (equal hits, smallest code) fall out of iteration.
    let mut tallies: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (keyword, codes) in snapshot.index.keywords() {
        if !keyword_matches(keyword, &lower, &tokens) {
            continue;
        }
        for code in codes {
            tallies.entry(code.as_str()).or_default().push(keyword);
        }
    }

    let mut best: Option<(&str, Vec<&str>)> = None;
    for (code, matched) in tallies {
        let replace = match &best {
            None => true,
            Some((_, best_matched)) => matched.len() > best_matched.len(),
        };
        if replace {
            best = Some((code, matched));
        }
    }

    let (code, mut matched) = best?;
    matched.sort_unstable();
    let confidence = (config.keyword_base + config.keyword_step * matched.len() as f32)
        .min(config.keyword_cap);
    Some(Candidate {
        code: code.to_string(),
        confidence,
        reasoning: format!(
            "{} catalog keyword hit(s) for GL {code}: {}",
            matched.len(),
            matched.join(", ")
        ),
        matched_keywords: matched.iter().map(|k| k.to_string()).collect(),
        method: ClassificationMethod::KeywordScore,
    })
}
