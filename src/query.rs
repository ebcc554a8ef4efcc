//! Query layer: fetch alignments for words and enrich them with derived
//! display fields and within-result-set frequency statistics.
//!
//! Original-language searches go through the inverted index; target-language
//! searches resolve word rows first and answer membership through the join
//! table. Enrichment is a pure function of the fetched set: frequency and
//! match counts are relative to the result set, not the whole corpus.

use std::collections::BTreeMap;

use log::debug;

use crate::error::Result;
use crate::store::{AlignmentDb, SnapshotField};
use crate::types::{AlignmentRecord, EnrichedAlignment, Side, WordRecord};

/// Switches for one query run.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Search the original-language side (via the index) rather than the
    /// target-language word tables.
    pub search_original: bool,
    /// Match on lemma instead of surface text.
    pub search_lemma: bool,
    /// Fold case when matching target-language words.
    pub case_insensitive: bool,
    /// Cap on matched word rows for target-side searches.
    pub max_rows: Option<usize>,
    /// Merge a trailing possessive token into the preceding word, so that
    /// tokenized `king s` renders as `king's`.
    pub merge_possessive: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            search_original: true,
            search_lemma: false,
            case_insensitive: false,
            max_rows: None,
            merge_possessive: true,
        }
    }
}

/// Fetch the raw alignments for one search word, without enrichment.
pub fn alignments_for_word(
    db: &AlignmentDb,
    word: &str,
    options: &QueryOptions,
) -> Result<Vec<AlignmentRecord>> {
    if options.search_original {
        alignments_for_original_word(db, word, options.search_lemma)
    } else {
        alignments_for_target_word(db, word, options)
    }
}

fn alignments_for_original_word(
    db: &AlignmentDb,
    word: &str,
    by_lemma: bool,
) -> Result<Vec<AlignmentRecord>> {
    let entries = db.index_entries_for(word, by_lemma)?;
    if entries.is_empty() {
        // No index coverage (e.g. the index was never flushed for this
        // word); fall back to scanning the denormalized snapshots.
        debug!("alignments_for_word - no index entry for {word}, scanning snapshots");
        let field = if by_lemma {
            SnapshotField::Lemma
        } else {
            SnapshotField::Word
        };
        return db.alignments_with_snapshot_match(Side::Original, field, word);
    }
    let mut out = Vec::new();
    for entry in &entries {
        for &id in &entry.alignments {
            if let Some(record) = db.alignment_by_id(id)? {
                out.push(record);
            } else {
                debug!("alignments_for_word - index references missing alignment {id}");
            }
        }
    }
    Ok(out)
}

fn alignments_for_target_word(
    db: &AlignmentDb,
    word: &str,
    options: &QueryOptions,
) -> Result<Vec<AlignmentRecord>> {
    let word_rows = db.find_words(
        Side::Target,
        &[word],
        false,
        options.case_insensitive,
        options.max_rows,
    )?;
    let mut out: Vec<AlignmentRecord> = Vec::new();
    for row in &word_rows {
        for record in db.alignments_containing_word(Side::Target, row.id)? {
            if !out.iter().any(|r| r.id == record.id) {
                out.push(record);
            }
        }
    }
    Ok(out)
}

/// Fetch and enrich alignments for each search word. Frequency statistics
/// are computed per word's result set before the sets are concatenated.
pub fn query_alignments(
    db: &AlignmentDb,
    words: &[&str],
    options: &QueryOptions,
) -> Result<Vec<EnrichedAlignment>> {
    let mut out = Vec::new();
    for word in words {
        let raw = alignments_for_word(db, word, options)?;
        debug!("query_alignments - {word}: {} raw alignments", raw.len());
        out.extend(enrich_alignments(&raw, options.merge_possessive));
    }
    Ok(out)
}

/// Span of a word group: distance between its outermost verse positions.
fn span(words: &[WordRecord]) -> i64 {
    let min = words.iter().map(|w| w.word_num).min();
    let max = words.iter().map(|w| w.word_num).max();
    match (min, max) {
        (Some(min), Some(max)) => max - min,
        _ => 0,
    }
}

/// How many non-member words the group stretches across: span minus the
/// internal steps of the group itself.
fn words_between(words: &[WordRecord]) -> i64 {
    if words.is_empty() {
        return 0;
    }
    span(words) - (words.len() as i64 - 1)
}

/// Join a word group's surface text in verse order.
pub fn combine_word_list(words: &[WordRecord]) -> String {
    let mut ordered: Vec<&WordRecord> = words.iter().collect();
    ordered.sort_by_key(|w| w.word_num);
    ordered
        .iter()
        .map(|w| w.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fuse the first bare possessive `s` token into its preceding word, so
/// tokenized `king s crown` reads `king's crown`. Returns the rewritten
/// text only when a merge happened.
fn merge_possessive_text(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split(' ').collect();
    let i = tokens.iter().position(|t| *t == "s")?;
    if i == 0 {
        return None;
    }
    let mut out: Vec<String> = Vec::with_capacity(tokens.len() - 1);
    for (j, token) in tokens.iter().enumerate() {
        if j == i {
            continue;
        }
        if j == i - 1 {
            out.push(format!("{token}'s"));
        } else {
            out.push((*token).to_string());
        }
    }
    Some(out.join(" "))
}

/// Derive display fields for every record, then layer on frequency
/// statistics relative to this set.
///
/// The possessive merge is a target-side rewrite: when it fires, the fused
/// token no longer counts as a word, so the target word count and span each
/// shrink by one.
pub fn enrich_alignments(
    records: &[AlignmentRecord],
    merge_possessive: bool,
) -> Vec<EnrichedAlignment> {
    let mut enriched: Vec<EnrichedAlignment> = records
        .iter()
        .map(|record| {
            let orig_words_txt = combine_word_list(&record.orig_words);
            let mut target_words_txt = combine_word_list(&record.target_words);
            let mut alignment_target_words = record.target_words.len() as i64;
            let mut target_span = span(&record.target_words);
            if merge_possessive {
                if let Some(merged) = merge_possessive_text(&target_words_txt) {
                    target_words_txt = merged;
                    alignment_target_words -= 1;
                    target_span -= 1;
                }
            }
            let alignment_txt = format!("{orig_words_txt} = {target_words_txt}");
            EnrichedAlignment {
                id: record.id.to_string(),
                book_id: record.book_id.clone(),
                chapter: record.chapter.clone(),
                verse: record.verse.clone(),
                alignment_num: record.alignment_num.to_string(),
                orig_span: span(&record.orig_words),
                target_span,
                orig_words_between: words_between(&record.orig_words),
                target_words_between: words_between(&record.target_words),
                alignment_orig_words: record.orig_words.len() as i64,
                alignment_target_words,
                orig_words: record.orig_words.clone(),
                target_words: record.target_words.clone(),
                orig_words_txt,
                target_words_txt,
                alignment_txt,
                frequency: 0.0,
                match_count: 0,
            }
        })
        .collect();

    add_frequency_stats(&mut enriched);
    enriched
}

/// For each row: match_count = how many rows in the set share its rendered
/// alignment text, frequency = that count over the set size.
pub fn add_frequency_stats(rows: &mut [EnrichedAlignment]) {
    let total = rows.len();
    if total == 0 {
        return;
    }
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for row in rows.iter() {
        *counts.entry(row.alignment_txt.as_str()).or_insert(0) += 1;
    }
    let counts: BTreeMap<String, i64> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    for row in rows.iter_mut() {
        let count = counts.get(&row.alignment_txt).copied().unwrap_or(0);
        row.match_count = count;
        row.frequency = count as f64 / total as f64;
    }
}

/// Keep rows whose match_count-to-frequency ratio meets the threshold; the
/// comparison is inclusive, and a negative threshold accepts everything.
pub fn filter_alignments(
    rows: Vec<EnrichedAlignment>,
    min_alignments: f64,
) -> Vec<EnrichedAlignment> {
    if min_alignments < 0.0 {
        return rows;
    }
    rows.into_iter()
        .filter(|row| row.frequency > 0.0 && row.match_count as f64 / row.frequency >= min_alignments)
        .collect()
}

/// Regroup a lemma-searched result set by the surface form of the word that
/// matched the lemma, then recompute frequency statistics within each
/// sub-group so they describe the sub-group, not the combined set.
///
/// A row with no word matching the lemma (possible after a surface-text
/// search) falls back to its whole original-side text as the key.
pub fn split_by_original_word(
    rows: Vec<EnrichedAlignment>,
    lemma: &str,
) -> BTreeMap<String, Vec<EnrichedAlignment>> {
    let mut groups: BTreeMap<String, Vec<EnrichedAlignment>> = BTreeMap::new();
    for row in rows {
        let key = row
            .orig_words
            .iter()
            .find(|w| w.lemma == lemma)
            .map(|w| w.word.clone())
            .unwrap_or_else(|| row.orig_words_txt.clone());
        groups.entry(key).or_default().push(row);
    }
    for group in groups.values_mut() {
        add_frequency_stats(group);
    }
    groups
}
