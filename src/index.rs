//! Inverted index over original-language surface forms.
//!
//! Accumulated in memory across a whole testament build, then flushed to the
//! `original_words_index` table in one upsert pass. One entry per distinct
//! surface form; the entry's lemma and strong come from the first occurrence
//! seen, and its alignment-id list is insertion-ordered with no duplicates.

use std::collections::BTreeMap;

use log::info;

use crate::error::Result;
use crate::store::AlignmentDb;
use crate::types::{AlignmentRecord, IndexEntry};

#[derive(Debug, Default)]
pub struct AlignmentsIndex {
    entries: BTreeMap<String, IndexEntry>,
}

impl AlignmentsIndex {
    pub fn new() -> Self {
        AlignmentsIndex::default()
    }

    /// Record one persisted alignment under each of its original-language
    /// surface forms.
    pub fn add_alignment(&mut self, record: &AlignmentRecord) {
        for word in &record.orig_words {
            let entry = self
                .entries
                .entry(word.word.clone())
                .or_insert_with(|| IndexEntry {
                    original_word: word.word.clone(),
                    lemma: word.lemma.clone(),
                    strong: word.strong.clone(),
                    alignments: Vec::new(),
                    frequency: String::new(),
                });
            if !entry.alignments.contains(&record.id) {
                entry.alignments.push(record.id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Upsert every accumulated entry; existing rows for the same surface
    /// form are replaced wholesale.
    pub fn flush(&self, db: &mut AlignmentDb) -> Result<usize> {
        let written = db.upsert_index_entries(self.entries())?;
        info!("flushed {written} index entries");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::word_record;
    use crate::types::VerseKey;

    fn alignment(id: i64, words: &[(&str, &str, &str)]) -> AlignmentRecord {
        let key = VerseKey::new("tit", "1", "1");
        let orig_words = words
            .iter()
            .enumerate()
            .map(|(i, (word, lemma, strong))| {
                let mut w = word_record(&key, i as i64, word, 1);
                w.lemma = lemma.to_string();
                w.strong = strong.to_string();
                w
            })
            .collect();
        AlignmentRecord {
            id,
            book_id: "tit".to_string(),
            chapter: "1".to_string(),
            verse: "1".to_string(),
            alignment_num: 0,
            orig_ids: Vec::new(),
            target_ids: Vec::new(),
            orig_words,
            target_words: Vec::new(),
        }
    }

    #[test]
    fn test_one_entry_per_surface_form() {
        let mut index = AlignmentsIndex::new();
        index.add_alignment(&alignment(1, &[("λόγος", "λόγος", "G3056")]));
        index.add_alignment(&alignment(2, &[("λόγος", "λόγος", "G3056")]));
        index.add_alignment(&alignment(3, &[("λόγον", "λόγος", "G3056")]));

        assert_eq!(index.len(), 2);
        let entries: Vec<&IndexEntry> = index.entries().collect();
        let logos = entries.iter().find(|e| e.original_word == "λόγος").unwrap();
        assert_eq!(logos.alignments, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let mut index = AlignmentsIndex::new();
        // Same surface form twice within one alignment.
        index.add_alignment(&alignment(
            5,
            &[("καί", "καί", "G2532"), ("καί", "καί", "G2532")],
        ));
        let entry = index.entries().next().unwrap();
        assert_eq!(entry.alignments, vec![5]);
    }

    #[test]
    fn test_first_seen_metadata_wins() {
        let mut index = AlignmentsIndex::new();
        index.add_alignment(&alignment(1, &[("θεός", "θεός", "G2316")]));
        index.add_alignment(&alignment(2, &[("θεός", "other", "G9999")]));
        let entry = index.entries().next().unwrap();
        assert_eq!(entry.lemma, "θεός");
        assert_eq!(entry.strong, "G2316");
    }

    #[test]
    fn test_flush_writes_rows() {
        let mut db = AlignmentDb::open_in_memory().unwrap();
        let mut index = AlignmentsIndex::new();
        index.add_alignment(&alignment(1, &[("λόγος", "λόγος", "G3056")]));
        assert_eq!(index.flush(&mut db).unwrap(), 1);

        let found = db.index_entries_for("λόγος", false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].strong, "G3056");
    }
}
