//! Training-data export: one JSON and one CSV document per lemma, a combined
//! document under the caller's key, and a top-level index of everything
//! written.
//!
//! Each lemma's alignments are fetched through the query layer, filtered by
//! the caller's threshold, and regrouped by the surface form they resolved
//! to. The JSON documents carry the grouped structure; the CSVs flatten the
//! same rows for tabular tooling.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::BufWriter;

use log::{info, warn};
use serde::Serialize;

use crate::config::AlignmentConfig;
use crate::error::Result;
use crate::query::{
    add_frequency_stats, alignments_for_word, enrich_alignments, filter_alignments,
    split_by_original_word, QueryOptions,
};
use crate::store::AlignmentDb;
use crate::types::{EnrichedAlignment, Side};

/// What one export pass wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub keys: usize,
    pub rows: usize,
}

/// Per-key entry of the export index document. Lemma entries carry the
/// surface forms they grouped into; the combined entry carries the lemma
/// list instead.
#[derive(Debug, Serialize)]
struct IndexEntryDoc {
    #[serde(rename = "alignmentsCount")]
    alignments_count: usize,
    #[serde(rename = "originalWords", skip_serializing_if = "Option::is_none")]
    original_words: Option<Vec<String>>,
    #[serde(rename = "lemmaList", skip_serializing_if = "Option::is_none")]
    lemma_list: Option<Vec<String>>,
}

/// Flat row shape for the CSV documents.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    book_id: &'a str,
    chapter: &'a str,
    verse: &'a str,
    alignment_num: &'a str,
    orig_words_txt: &'a str,
    target_words_txt: &'a str,
    alignment_txt: &'a str,
    match_count: i64,
    frequency: f64,
    orig_span: i64,
    target_span: i64,
    orig_words_between: i64,
    target_words_between: i64,
    alignment_orig_words: i64,
    alignment_target_words: i64,
}

impl<'a> From<&'a EnrichedAlignment> for CsvRow<'a> {
    fn from(row: &'a EnrichedAlignment) -> Self {
        CsvRow {
            id: &row.id,
            book_id: &row.book_id,
            chapter: &row.chapter,
            verse: &row.verse,
            alignment_num: &row.alignment_num,
            orig_words_txt: &row.orig_words_txt,
            target_words_txt: &row.target_words_txt,
            alignment_txt: &row.alignment_txt,
            match_count: row.match_count,
            frequency: row.frequency,
            orig_span: row.orig_span,
            target_span: row.target_span,
            orig_words_between: row.orig_words_between,
            target_words_between: row.target_words_between,
            alignment_orig_words: row.alignment_orig_words,
            alignment_target_words: row.alignment_target_words,
        }
    }
}

/// Resolve a search-word list to the distinct lemmas it covers: each word
/// matched against surface forms and against lemmas directly. A word that
/// matches nothing contributes nothing.
fn lemmas_for_words(db: &AlignmentDb, words: &[&str]) -> Result<Vec<String>> {
    let mut lemmas: BTreeSet<String> = BTreeSet::new();
    for rows in [
        db.find_words(Side::Original, words, false, false, None)?,
        db.find_words(Side::Original, words, true, false, None)?,
    ] {
        for row in rows {
            if !row.lemma.is_empty() {
                lemmas.insert(row.lemma);
            }
        }
    }
    Ok(lemmas.into_iter().collect())
}

/// Export training data for a word list under one key.
///
/// An empty word list exports every lemma the index knows. Each lemma gets
/// `{dir}/{lemma}.json` and `.csv`; the combined filtered rows land in
/// `{dir}/{key}.json` and `.csv`; `{dir}/index.json` records what was
/// written.
pub fn export_training_data(
    db: &AlignmentDb,
    config: &AlignmentConfig,
    key: &str,
    words: &[&str],
    min_alignments: f64,
    merge_possessive: bool,
) -> Result<ExportSummary> {
    fs::create_dir_all(&config.training_data_dir)?;

    let lemmas = if words.is_empty() {
        db.distinct_lemmas()?
    } else {
        lemmas_for_words(db, words)?
    };

    let options = QueryOptions {
        search_original: true,
        search_lemma: true,
        merge_possessive,
        ..Default::default()
    };

    let mut summary = ExportSummary::default();
    let mut index_doc: BTreeMap<String, IndexEntryDoc> = BTreeMap::new();
    let mut combined_groups: BTreeMap<String, Vec<EnrichedAlignment>> = BTreeMap::new();
    let mut exported_lemmas: Vec<String> = Vec::new();

    for lemma in &lemmas {
        let raw = alignments_for_word(db, lemma, &options)?;
        let rows = filter_alignments(enrich_alignments(&raw, merge_possessive), min_alignments);
        if rows.is_empty() {
            warn!("export - no alignments pass the threshold for {lemma}");
            continue;
        }
        let row_count = rows.len();
        let groups = split_by_original_word(rows, lemma);
        write_key(config, lemma, &groups)?;

        for (word, group) in &groups {
            combined_groups
                .entry(word.clone())
                .or_default()
                .extend(group.iter().cloned());
        }
        index_doc.insert(
            lemma.clone(),
            IndexEntryDoc {
                alignments_count: row_count,
                original_words: Some(groups.keys().cloned().collect()),
                lemma_list: None,
            },
        );
        exported_lemmas.push(lemma.clone());
        summary.keys += 1;
        summary.rows += row_count;
    }

    if !combined_groups.is_empty() {
        let total: usize = combined_groups.values().map(Vec::len).sum();
        // Two lemmas can share a surface form; the merged group's
        // statistics describe the merged set.
        for group in combined_groups.values_mut() {
            add_frequency_stats(group);
        }
        write_key(config, key, &combined_groups)?;
        index_doc.insert(
            key.to_string(),
            IndexEntryDoc {
                alignments_count: total,
                original_words: None,
                lemma_list: Some(exported_lemmas),
            },
        );
    }

    let index_file = File::create(config.export_index_path())?;
    serde_json::to_writer_pretty(BufWriter::new(index_file), &index_doc)?;
    info!(
        "export - wrote {} lemmas ({} rows) under {} to {}",
        summary.keys,
        summary.rows,
        key,
        config.training_data_dir.display()
    );
    Ok(summary)
}

fn write_key(
    config: &AlignmentConfig,
    key: &str,
    groups: &BTreeMap<String, Vec<EnrichedAlignment>>,
) -> Result<()> {
    let json_file = File::create(config.export_path(key, "json"))?;
    serde_json::to_writer_pretty(BufWriter::new(json_file), groups)?;

    let mut writer = csv::Writer::from_path(config.export_path(key, "csv"))?;
    for rows in groups.values() {
        for row in rows {
            writer.serialize(CsvRow::from(row))?;
        }
    }
    writer.flush()?;
    Ok(())
}
