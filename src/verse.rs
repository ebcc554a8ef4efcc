//! Verse tree walker: flattens a verse's nested word/milestone structure.
//!
//! A verse arrives as a list of tagged nodes. `word` nodes are leaves
//! carrying surface text and linguistic metadata; `milestone` nodes span one
//! alignment group, carry the original-language word they cover in
//! `content`, and nest further nodes (target words and nested milestones)
//! in `children`.
//!
//! The walker is a pure function of the tree. Position bookkeeping is
//! threaded explicitly: each recursive call takes the running target-word
//! counter and returns the next value, so there is no hidden mutable state.
//!
//! # Invariants
//!
//! 1. **DOCUMENT_ORDER**: words are emitted in pre-order traversal order,
//!    milestones transparent.
//! 2. **GROUP_PER_MILESTONE**: one alignment group per milestone at any
//!    depth; a nested milestone contributes its own group members to the
//!    enclosing group as well.
//! 3. **DENSE_OCCURRENCES**: for a fixed surface text within one verse,
//!    occurrence values are 1..k in emission order.

use log::warn;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::types::{Side, VerseKey, WordRecord};

const TYPE_WORD: &str = "word";
const TYPE_MILESTONE: &str = "milestone";

fn default_occurrence() -> i64 {
    1
}

/// Occurrence attributes appear as numbers in some resource versions and
/// as numeric strings in others.
fn occurrence_from_any<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(1),
        serde_json::Value::String(s) => s.parse().unwrap_or(1),
        _ => 1,
    })
}

/// One node of a verse-object tree.
///
/// Deserialization is permissive: unknown tags and absent fields are kept
/// rather than rejected, so a single malformed node never fails a whole
/// chapter. The walker decides what to do with each tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerseNode {
    #[serde(rename = "type")]
    pub node_type: String,
    /// Surface text of a word leaf.
    pub text: String,
    /// Alternate surface-text key used by some source formats.
    pub word: String,
    /// Original-language text spanned by a milestone.
    pub content: String,
    #[serde(
        default = "default_occurrence",
        deserialize_with = "occurrence_from_any"
    )]
    pub occurrence: i64,
    pub strong: String,
    pub lemma: String,
    pub morph: String,
    pub children: Vec<VerseNode>,
}

impl VerseNode {
    /// Surface text: `text`, falling back to `word`, else empty.
    pub fn surface_text(&self) -> &str {
        if !self.text.is_empty() {
            &self.text
        } else {
            &self.word
        }
    }

    /// The original-language word a milestone itself represents: the node
    /// with its `content` promoted to `text` and children stripped.
    fn top_word(&self) -> VerseNode {
        VerseNode {
            text: self.content.clone(),
            children: Vec::new(),
            ..self.clone()
        }
    }
}

/// One alignment group: the original-language words of a milestone paired
/// with the target-language words nested beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentGroup {
    pub top_words: Vec<VerseNode>,
    pub bottom_words: Vec<VerseNode>,
}

/// Flatten a verse tree into its original-language word leaves, in document
/// order. Milestones are transparent; unrecognized nodes are logged and
/// skipped.
pub fn words_from_verse(nodes: &[VerseNode]) -> Vec<&VerseNode> {
    let mut words = Vec::new();
    collect_words(nodes, &mut words);
    words
}

fn collect_words<'a>(nodes: &'a [VerseNode], out: &mut Vec<&'a VerseNode>) {
    for node in nodes {
        match node.node_type.as_str() {
            TYPE_WORD => out.push(node),
            TYPE_MILESTONE => collect_words(&node.children, out),
            other => {
                warn!(
                    "words_from_verse - unrecognized node type {:?} in {:?}",
                    other,
                    node.surface_text()
                );
            }
        }
    }
}

/// Flatten a verse tree into its flat target-language word sequence and its
/// alignment groups, one group per top-level milestone.
///
/// The target-word counter starts at 0 for every verse and is threaded
/// through nested milestones explicitly.
pub fn alignments_from_verse(nodes: &[VerseNode]) -> (Vec<VerseNode>, Vec<AlignmentGroup>) {
    let mut target_words = Vec::new();
    let mut alignments = Vec::new();
    let mut word_num = 0usize;

    for node in nodes {
        match node.node_type.as_str() {
            TYPE_WORD => {
                target_words.push(node.clone());
                word_num += 1;
            }
            TYPE_MILESTONE => {
                let (top_words, bottom_words, next) = parse_alignment(node, word_num);
                target_words.extend(bottom_words.iter().cloned());
                alignments.push(AlignmentGroup {
                    top_words,
                    bottom_words,
                });
                word_num = next;
            }
            other => {
                warn!(
                    "alignments_from_verse - unrecognized node type {:?} in {:?}",
                    other,
                    node.surface_text()
                );
            }
        }
    }

    (target_words, alignments)
}

/// Recurse into one milestone: the milestone itself is the first top word,
/// its word children are bottom words, and nested milestones contribute
/// both. Returns the accumulated words plus the next target-word counter.
fn parse_alignment(
    milestone: &VerseNode,
    mut word_num: usize,
) -> (Vec<VerseNode>, Vec<VerseNode>, usize) {
    let mut top_words = vec![milestone.top_word()];
    let mut bottom_words = Vec::new();

    for node in &milestone.children {
        match node.node_type.as_str() {
            TYPE_WORD => {
                bottom_words.push(node.clone());
                word_num += 1;
            }
            TYPE_MILESTONE => {
                let (child_top, child_bottom, next) = parse_alignment(node, word_num);
                top_words.extend(child_top);
                bottom_words.extend(child_bottom);
                word_num = next;
            }
            other => {
                warn!(
                    "parse_alignment - unrecognized node type {:?} in {:?}",
                    other,
                    node.surface_text()
                );
            }
        }
    }

    (top_words, bottom_words, word_num)
}

/// Count how many earlier records in the same verse carry this surface text.
fn occurrences_so_far(text: &str, records: &[WordRecord]) -> i64 {
    records.iter().filter(|r| r.word == text).count() as i64
}

/// Convert a flat word sequence into word rows for one verse.
///
/// `word_num` is the 0-based emission index; `occurrence` is computed by
/// scanning the records already emitted for the same verse, which yields
/// the dense 1..k sequence the resolver depends on. Original-side rows keep
/// their linguistic metadata; target-side rows leave it empty.
pub fn word_records_for_verse(words: &[&VerseNode], key: &VerseKey, side: Side) -> Vec<WordRecord> {
    let mut records: Vec<WordRecord> = Vec::with_capacity(words.len());
    for (i, node) in words.iter().enumerate() {
        let text = node.surface_text().to_string();
        let occurrence = occurrences_so_far(&text, &records) + 1;
        let (strong, lemma, morph) = match side {
            Side::Original => (
                node.strong.clone(),
                node.lemma.clone(),
                node.morph.clone(),
            ),
            Side::Target => (String::new(), String::new(), String::new()),
        };
        records.push(WordRecord {
            id: 0,
            book_id: key.book_id.clone(),
            chapter: key.chapter.clone(),
            verse: key.verse.clone(),
            word_num: i as i64,
            word: text,
            occurrence,
            strong,
            lemma,
            morph,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{milestone, word_node};
    use proptest::prelude::*;

    #[test]
    fn test_words_from_verse_flattens_milestones() {
        let nodes = vec![
            milestone("λόγος", vec![word_node("word")]),
            milestone("θεός", vec![word_node("God")]),
        ];
        // For original-language trees the leaves under milestones are the
        // words; here the walker sees the nested word leaves.
        let words = words_from_verse(&nodes);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].surface_text(), "word");
    }

    #[test]
    fn test_words_from_verse_plain_words() {
        let nodes = vec![word_node("ἐν"), word_node("ἀρχῇ")];
        let words = words_from_verse(&nodes);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].surface_text(), "ἀρχῇ");
    }

    #[test]
    fn test_unrecognized_node_skipped() {
        let mut odd = word_node("stray");
        odd.node_type = "footnote".to_string();
        let nodes = vec![word_node("kept"), odd];
        assert_eq!(words_from_verse(&nodes).len(), 1);
    }

    #[test]
    fn test_alignments_one_group_per_milestone() {
        let nodes = vec![
            milestone("λόγος", vec![word_node("the"), word_node("word")]),
            milestone("θεός", vec![word_node("God")]),
        ];
        let (target_words, groups) = alignments_from_verse(&nodes);
        assert_eq!(target_words.len(), 3);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].top_words.len(), 1);
        assert_eq!(groups[0].top_words[0].surface_text(), "λόγος");
        assert_eq!(groups[0].bottom_words.len(), 2);
        assert_eq!(groups[1].bottom_words[0].surface_text(), "God");
    }

    #[test]
    fn test_nested_milestone_merges_into_outer_group() {
        let inner = milestone("θεοῦ", vec![word_node("God's")]);
        let outer = milestone("λόγος", vec![word_node("word"), inner]);
        let (target_words, groups) = alignments_from_verse(&[outer]);

        // One top-level milestone, one group; the nested milestone adds its
        // top and bottom words to it.
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        let tops: Vec<&str> = group.top_words.iter().map(|w| w.surface_text()).collect();
        assert_eq!(tops, vec!["λόγος", "θεοῦ"]);
        let bottoms: Vec<&str> = group
            .bottom_words
            .iter()
            .map(|w| w.surface_text())
            .collect();
        assert_eq!(bottoms, vec!["word", "God's"]);
        assert_eq!(target_words.len(), 2);
    }

    #[test]
    fn test_word_records_occurrence_counting() {
        let key = VerseKey::new("jhn", "1", "1");
        let a = word_node("the");
        let b = word_node("word");
        let c = word_node("the");
        let words = vec![&a, &b, &c];
        let records = word_records_for_verse(&words, &key, Side::Target);

        assert_eq!(records[0].occurrence, 1);
        assert_eq!(records[1].occurrence, 1);
        assert_eq!(records[2].occurrence, 2);
        assert_eq!(records[2].word_num, 2);
    }

    #[test]
    fn test_target_records_drop_linguistic_metadata() {
        let key = VerseKey::new("jhn", "1", "1");
        let mut node = word_node("word");
        node.strong = "G3056".to_string();
        node.lemma = "λόγος".to_string();
        let binding = vec![&node];
        let records = word_records_for_verse(&binding, &key, Side::Target);
        assert!(records[0].strong.is_empty());
        assert!(records[0].lemma.is_empty());
    }

    #[test]
    fn test_occurrence_parses_string_and_number() {
        let from_num: VerseNode =
            serde_json::from_str(r#"{"type":"word","text":"a","occurrence":2}"#).unwrap();
        let from_str: VerseNode =
            serde_json::from_str(r#"{"type":"word","text":"a","occurrence":"2"}"#).unwrap();
        assert_eq!(from_num.occurrence, 2);
        assert_eq!(from_str.occurrence, 2);
    }

    proptest! {
        /// For every verse, occurrence values per surface form are a dense
        /// 1..k sequence in emission order.
        #[test]
        fn occurrences_are_dense(texts in prop::collection::vec("[a-c]", 0..20)) {
            let key = VerseKey::new("mat", "1", "1");
            let nodes: Vec<VerseNode> = texts.iter().map(|t| word_node(t)).collect();
            let refs: Vec<&VerseNode> = nodes.iter().collect();
            let records = word_records_for_verse(&refs, &key, Side::Target);

            let mut seen: std::collections::HashMap<&str, i64> = Default::default();
            for record in &records {
                let counter = seen.entry(record.word.as_str()).or_insert(0);
                *counter += 1;
                prop_assert_eq!(record.occurrence, *counter);
            }
        }
    }
}
