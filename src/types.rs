//! The record types the alignment store is built from.
//!
//! These are the typed replacements for what the source data formats treat
//! as loosely-keyed dictionaries: every field is named, and every
//! "missing key" case is an explicit default.
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **WordRecord**: within one (book_id, chapter, verse) group, for a fixed
//!   `word`, the `occurrence` values form a dense 1..k sequence in emission
//!   order. This is the key used to disambiguate repeated words.
//! - **AlignmentRecord**: persisted only if *every* member word on both
//!   sides resolved to a stored word row. Partial alignments are treated as
//!   data corruption, not partial successes.
//! - **IndexEntry**: one entry per distinct original-language surface form
//!   per testament; `alignments` holds no duplicate ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of an alignment a word belongs to.
///
/// Original and target words live in separate tables and occurrence
/// counting is scoped to each side independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Original,
    Target,
}

impl Side {
    /// Name of the backing words table for this side.
    pub fn table(self) -> &'static str {
        match self {
            Side::Original => "original_words",
            Side::Target => "target_words",
        }
    }

    /// Tag stored in the alignment membership table.
    pub fn tag(self) -> &'static str {
        match self {
            Side::Original => "orig",
            Side::Target => "target",
        }
    }
}

/// Which testament a build pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Testament {
    Old,
    New,
}

impl fmt::Display for Testament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Testament::Old => write!(f, "OT"),
            Testament::New => write!(f, "NT"),
        }
    }
}

/// Location of one verse: (book, chapter, verse).
///
/// Chapter and verse stay strings because that is how the source files key
/// them; the pipeline only ever compares them for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseKey {
    pub book_id: String,
    pub chapter: String,
    pub verse: String,
}

impl VerseKey {
    pub fn new(book_id: &str, chapter: &str, verse: &str) -> Self {
        VerseKey {
            book_id: book_id.to_string(),
            chapter: chapter.to_string(),
            verse: verse.to_string(),
        }
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}:{}", self.book_id, self.chapter, self.verse)
    }
}

/// One word row, original- or target-language.
///
/// `strong`, `lemma`, and `morph` carry linguistic metadata for
/// original-language words and stay empty for target-language words.
/// `id` is 0 until the row is inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    #[serde(default)]
    pub id: i64,
    pub book_id: String,
    pub chapter: String,
    pub verse: String,
    /// 0-based position within the verse, in walker emission order.
    pub word_num: i64,
    /// Surface text.
    pub word: String,
    /// 1-based ordinal among identical surface text within the same verse.
    pub occurrence: i64,
    #[serde(default)]
    pub strong: String,
    #[serde(default)]
    pub lemma: String,
    #[serde(default)]
    pub morph: String,
}

impl WordRecord {
    pub fn verse_key(&self) -> VerseKey {
        VerseKey::new(&self.book_id, &self.chapter, &self.verse)
    }
}

/// Render word-row ids as a comma-delimited string bracketed by leading and
/// trailing delimiters, e.g. `",12,13,"`.
///
/// The bracketing makes "is id X present" testable as a delimiter-bounded
/// substring without false positives on numeric prefixes. Membership
/// *queries* go through the `alignment_members` join table instead; this
/// rendering survives for export compatibility.
pub fn bracketed_keys(ids: &[i64]) -> String {
    let inner: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!(",{},", inner.join(","))
}

/// Parse a bracketed key string back into ids. Empty segments are skipped.
pub fn parse_bracketed_keys(keys: &str) -> Vec<i64> {
    keys.split(',')
        .filter_map(|part| part.parse::<i64>().ok())
        .collect()
}

/// One persisted alignment: a group of original-language words mapped to a
/// group of target-language words within a single verse.
///
/// The word vectors are denormalized snapshots of the resolved rows, taken
/// at persist time so that query-side enrichment never needs a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    #[serde(default)]
    pub id: i64,
    pub book_id: String,
    pub chapter: String,
    pub verse: String,
    /// 0-based index of this alignment within its verse.
    pub alignment_num: i64,
    /// Ids of the original-language word rows, in input order.
    pub orig_ids: Vec<i64>,
    /// Ids of the target-language word rows, in input order.
    pub target_ids: Vec<i64>,
    pub orig_words: Vec<WordRecord>,
    pub target_words: Vec<WordRecord>,
}

impl AlignmentRecord {
    pub fn orig_lang_keys(&self) -> String {
        bracketed_keys(&self.orig_ids)
    }

    pub fn target_lang_keys(&self) -> String {
        bracketed_keys(&self.target_ids)
    }

    pub fn verse_key(&self) -> VerseKey {
        VerseKey::new(&self.book_id, &self.chapter, &self.verse)
    }
}

/// Inverted-index entry: one distinct original-language surface form and
/// the set of alignment ids it participates in across a testament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(rename = "originalWord")]
    pub original_word: String,
    pub lemma: String,
    pub strong: String,
    /// Alignment ids, insertion-ordered, no duplicates.
    pub alignments: Vec<i64>,
    /// Reserved; not computed at index-build time.
    #[serde(default)]
    pub frequency: String,
}

/// An alignment record enriched with derived display fields and
/// within-result-set frequency statistics.
///
/// `id` and `alignment_num` are stringified so downstream tabular analysis
/// never mistakes them for measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedAlignment {
    pub id: String,
    pub book_id: String,
    pub chapter: String,
    pub verse: String,
    pub alignment_num: String,
    pub orig_words: Vec<WordRecord>,
    pub target_words: Vec<WordRecord>,
    /// max word_num − min word_num among the original-side words, 0 if one.
    pub orig_span: i64,
    pub target_span: i64,
    /// Original-side words joined by single spaces, in word_num order.
    pub orig_words_txt: String,
    pub target_words_txt: String,
    pub alignment_orig_words: i64,
    pub alignment_target_words: i64,
    /// `"{orig words} = {target words}"`.
    pub alignment_txt: String,
    /// count(identical alignment_txt in result set) / result-set size.
    pub frequency: f64,
    pub match_count: i64,
    /// span − (word count − 1): how many outside words the alignment
    /// stretches across on each side.
    pub orig_words_between: i64,
    pub target_words_between: i64,
}

/// Row counts per logical table, for post-build reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub original_words: i64,
    pub target_words: i64,
    pub alignments: i64,
    pub index_entries: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_keys_single_id() {
        assert_eq!(bracketed_keys(&[42]), ",42,");
    }

    #[test]
    fn test_bracketed_keys_multiple_ids() {
        assert_eq!(bracketed_keys(&[1, 2, 3]), ",1,2,3,");
    }

    #[test]
    fn test_parse_bracketed_keys_roundtrip() {
        let ids = vec![7, 8, 120];
        assert_eq!(parse_bracketed_keys(&bracketed_keys(&ids)), ids);
    }

    #[test]
    fn test_parse_bracketed_keys_empty() {
        assert!(parse_bracketed_keys(",,").is_empty());
    }

    #[test]
    fn test_verse_key_display() {
        let key = VerseKey::new("tit", "1", "4");
        assert_eq!(key.to_string(), "tit-1:4");
    }

    #[test]
    fn test_side_tables() {
        assert_eq!(Side::Original.table(), "original_words");
        assert_eq!(Side::Target.table(), "target_words");
    }
}
