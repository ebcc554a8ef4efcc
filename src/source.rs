//! Source-text providers: chapter/verse JSON files and the lexicon.
//!
//! A resource tree is laid out as `{base}/{book_id}/{chapter}.json`, each
//! chapter file mapping verse labels to verse-object trees. The provider is
//! deliberately tolerant: a missing chapter file is `None` (the caller
//! skips the chapter), a non-numeric verse label is skipped, and a verse
//! that fails to parse is logged and yields no words.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::warn;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::verse::VerseNode;

/// Raw verse map of one chapter file, keyed by verse label.
pub type ChapterVerses = BTreeMap<String, Value>;

/// Reads chapter files from one resource tree.
#[derive(Debug, Clone)]
pub struct ChapterSource {
    base: PathBuf,
}

impl ChapterSource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        ChapterSource { base: base.into() }
    }

    pub fn book_dir(&self, book_id: &str) -> PathBuf {
        self.base.join(book_id)
    }

    /// Whether the tree carries any files for this book.
    pub fn has_book(&self, book_id: &str) -> bool {
        std::fs::read_dir(self.book_dir(book_id))
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// Load one chapter file, or `None` if the file is absent.
    pub fn load_chapter(&self, book_id: &str, chapter: &str) -> Result<Option<ChapterVerses>> {
        let path = self.book_dir(book_id).join(format!("{chapter}.json"));
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let verses: ChapterVerses = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(verses))
    }
}

/// Verse labels that are plain numbers, in numeric order. Labels like
/// `"front"` or ranges are not verses and are skipped.
pub fn numeric_verses(verses: &ChapterVerses) -> Vec<String> {
    let mut numbered: Vec<(u32, &String)> = verses
        .keys()
        .filter_map(|label| label.parse::<u32>().ok().map(|n| (n, label)))
        .collect();
    numbered.sort_unstable_by_key(|(n, _)| *n);
    numbered.into_iter().map(|(_, label)| label.clone()).collect()
}

/// Extract the verse-object nodes for one verse, logging and yielding an
/// empty list when the entry does not parse.
pub fn verse_objects(verses: &ChapterVerses, verse: &str) -> Vec<VerseNode> {
    let Some(entry) = verses.get(verse) else {
        return Vec::new();
    };
    match entry.get("verseObjects") {
        Some(objects) => match serde_json::from_value(objects.clone()) {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("verse_objects - unparseable verse {verse}: {e}");
                Vec::new()
            }
        },
        None => {
            warn!("verse_objects - no verseObjects in verse {verse}");
            Vec::new()
        }
    }
}

/// Look up lexical metadata for a Strong's code, e.g. `G3056` →
/// `{lexicon_path}/3056.json`.
///
/// Hebrew and Aramaic code spaces use a different lexicon layout and are
/// reported as unsupported.
pub fn lookup_lexicon(lexicon_path: &Path, strong: &str) -> Result<Option<Value>> {
    let Some(rest) = strong.strip_prefix('G') else {
        return Err(Error::UnsupportedLexiconCode(strong.to_string()));
    };
    let digits: String = rest.chars().take(4).collect();
    let index: u32 = digits
        .parse()
        .map_err(|_| Error::UnsupportedLexiconCode(strong.to_string()))?;

    let path = lexicon_path.join(format!("{index}.json"));
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("lookup_lexicon - no entry at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_reader(BufReader::new(file))?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_verses_sorted_and_filtered() {
        let mut verses = ChapterVerses::new();
        verses.insert("10".to_string(), json!({}));
        verses.insert("2".to_string(), json!({}));
        verses.insert("front".to_string(), json!({}));
        verses.insert("1".to_string(), json!({}));
        assert_eq!(numeric_verses(&verses), vec!["1", "2", "10"]);
    }

    #[test]
    fn test_verse_objects_parses_nodes() {
        let mut verses = ChapterVerses::new();
        verses.insert(
            "1".to_string(),
            json!({ "verseObjects": [ { "type": "word", "text": "λόγος" } ] }),
        );
        let nodes = verse_objects(&verses, "1");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].surface_text(), "λόγος");
    }

    #[test]
    fn test_verse_objects_missing_key_is_empty() {
        let mut verses = ChapterVerses::new();
        verses.insert("1".to_string(), json!({ "something": [] }));
        assert!(verse_objects(&verses, "1").is_empty());
        assert!(verse_objects(&verses, "2").is_empty());
    }

    #[test]
    fn test_missing_chapter_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = ChapterSource::new(dir.path());
        assert!(source.load_chapter("tit", "1").unwrap().is_none());
        assert!(!source.has_book("tit"));
    }

    #[test]
    fn test_lexicon_rejects_hebrew_codes() {
        let dir = tempfile::tempdir().unwrap();
        let result = lookup_lexicon(dir.path(), "H7225");
        assert!(matches!(result, Err(Error::UnsupportedLexiconCode(_))));
    }

    #[test]
    fn test_lexicon_reads_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("3056.json"),
            r#"{"brief":"a word, speech"}"#,
        )
        .unwrap();
        let entry = lookup_lexicon(dir.path(), "G3056").unwrap().unwrap();
        assert_eq!(entry["brief"], "a word, speech");
        assert!(lookup_lexicon(dir.path(), "G0001").unwrap().is_none());
    }
}
