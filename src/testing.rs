//! Test-support helpers shared by unit and integration tests.
//!
//! Compiled into the library so `tests/` can use them, but hidden from the
//! public API surface.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::store::AlignmentDb;
use crate::types::{Side, VerseKey, WordRecord};
use crate::verse::VerseNode;

/// A bare word leaf with the given surface text.
pub fn word_node(text: &str) -> VerseNode {
    VerseNode {
        node_type: "word".to_string(),
        text: text.to_string(),
        occurrence: 1,
        ..Default::default()
    }
}

/// A milestone spanning `content`, with the given nested nodes.
pub fn milestone(content: &str, children: Vec<VerseNode>) -> VerseNode {
    VerseNode {
        node_type: "milestone".to_string(),
        content: content.to_string(),
        occurrence: 1,
        children,
        ..Default::default()
    }
}

/// An unsaved word row at a verse position.
pub fn word_record(key: &VerseKey, word_num: i64, word: &str, occurrence: i64) -> WordRecord {
    WordRecord {
        id: 0,
        book_id: key.book_id.clone(),
        chapter: key.chapter.clone(),
        verse: key.verse.clone(),
        word_num,
        word: word.to_string(),
        occurrence,
        strong: String::new(),
        lemma: String::new(),
        morph: String::new(),
    }
}

/// Insert one word row and read it back with its assigned id.
pub fn stored_word(
    db: &mut AlignmentDb,
    side: Side,
    key: &VerseKey,
    word_num: i64,
    word: &str,
    occurrence: i64,
) -> WordRecord {
    let record = word_record(key, word_num, word, occurrence);
    db.insert_words(side, std::slice::from_ref(&record)).unwrap();
    db.find_word_in_verse(side, word, occurrence, key)
        .unwrap()
        .unwrap()
}

/// JSON for an original-language word leaf with linguistic metadata.
pub fn orig_word_json(text: &str, occurrence: i64, strong: &str, lemma: &str) -> Value {
    json!({
        "type": "word",
        "text": text,
        "occurrence": occurrence,
        "strong": strong,
        "lemma": lemma,
        "morph": "",
    })
}

/// JSON for a target-language word leaf.
pub fn target_word_json(text: &str, occurrence: i64) -> Value {
    json!({ "type": "word", "text": text, "occurrence": occurrence })
}

/// JSON for an alignment milestone covering one original word.
pub fn milestone_json(content: &str, occurrence: i64, children: Vec<Value>) -> Value {
    json!({
        "type": "milestone",
        "content": content,
        "occurrence": occurrence,
        "children": children,
    })
}

/// Write one chapter file under `{base}/{book_id}/{chapter}.json`. The value
/// must be a verse-label → `{verseObjects: [...]}` map.
pub fn write_chapter(base: &Path, book_id: &str, chapter: &str, verses: &Value) {
    let dir = base.join(book_id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{chapter}.json")),
        serde_json::to_vec_pretty(verses).unwrap(),
    )
    .unwrap();
}
