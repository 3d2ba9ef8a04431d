//! Keyword search over Cache full paths, answered with Index rows.
//!
//! Keywords are split on whitespace and matched case-insensitively as
//! substrings; any keyword matching is enough. Hits come back in physical
//! Index order so a UI can jump straight to the row.

use crate::commands::helpers::{read_cache, read_index};
use crate::commands::{CmdMessage, CmdResult, SearchHit};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::table::TableStore;
use std::collections::HashSet;
use tracing::debug;

pub fn keywords(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .flat_map(|t| t.split_whitespace())
        .map(str::to_lowercase)
        .collect()
}

pub fn run<C, I>(cache: &C, index: &I, config: &IndexConfig, terms: &[String]) -> Result<CmdResult>
where
    C: TableStore + ?Sized,
    I: TableStore + ?Sized,
{
    let words = keywords(terms);
    let mut result = CmdResult::default();
    if words.is_empty() {
        result.add_message(CmdMessage::info("Nothing to search for."));
        return Ok(result);
    }

    let matched: HashSet<String> = read_cache(cache, config)?
        .into_iter()
        .filter(|row| {
            let path = row.full_path.to_lowercase();
            words.iter().any(|w| path.contains(w.as_str()))
        })
        .map(|row| row.id)
        .collect();
    debug!(keywords = ?words, matched = matched.len(), "search");

    let hits: Vec<SearchHit> = read_index(index, config)?
        .into_iter()
        .filter(|(_, entry)| matched.contains(&entry.id))
        .map(|(row, entry)| SearchHit { row, entry })
        .collect();

    let message = match hits.len() {
        0 => "No matches.".to_string(),
        1 => "1 match found.".to_string(),
        n => format!("{} matches found.", n),
    };
    result.add_message(CmdMessage::info(message));
    Ok(result.with_hits(hits))
}
