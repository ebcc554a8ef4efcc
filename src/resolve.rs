//! Resolvers: map walker output back onto stored word rows.
//!
//! Word resolution is an exact (word, occurrence, verse) lookup against the
//! side's word table, using the occurrence the node itself carries. Alignment
//! resolution is all-or-nothing: if any member word on either side fails to
//! resolve, the whole alignment is dropped and logged, never persisted in
//! part.

use log::warn;

use crate::error::Result;
use crate::store::AlignmentDb;
use crate::types::{AlignmentRecord, Side, VerseKey, WordRecord};
use crate::verse::{AlignmentGroup, VerseNode};

/// Resolve one node to its stored word row. A miss is logged with enough
/// context to find the bad verse in the source data.
pub fn resolve_word(
    db: &AlignmentDb,
    side: Side,
    node: &VerseNode,
    key: &VerseKey,
) -> Result<Option<WordRecord>> {
    let word = node.surface_text();
    let found = db.find_word_in_verse(side, word, node.occurrence, key)?;
    if found.is_none() {
        warn!(
            "resolve_word - {} word not found: {}-{} in {}",
            side.tag(),
            word,
            node.occurrence,
            key
        );
    }
    Ok(found)
}

/// Resolve every node of one side. Every miss is looked up (and logged by
/// `resolve_word`) before the verdict: `None` when anything was missing.
fn resolve_all(
    db: &AlignmentDb,
    side: Side,
    nodes: &[VerseNode],
    key: &VerseKey,
) -> Result<Option<Vec<WordRecord>>> {
    let mut resolved = Vec::with_capacity(nodes.len());
    let mut complete = true;
    for node in nodes {
        match resolve_word(db, side, node, key)? {
            Some(record) => resolved.push(record),
            None => complete = false,
        }
    }
    Ok(complete.then_some(resolved))
}

/// Resolve one alignment group into a persistable record.
///
/// Returns `None` when any member on either side is missing from the store.
/// Both sides are walked fully first, so every missing word gets its own
/// log line before the group is dropped; the `id` of the returned record is
/// unset until insertion.
pub fn resolve_alignment(
    db: &AlignmentDb,
    group: &AlignmentGroup,
    key: &VerseKey,
    alignment_num: i64,
) -> Result<Option<AlignmentRecord>> {
    let orig_words = resolve_all(db, Side::Original, &group.top_words, key)?;
    let target_words = resolve_all(db, Side::Target, &group.bottom_words, key)?;
    let (Some(orig_words), Some(target_words)) = (orig_words, target_words) else {
        warn!("resolve_alignment - skipping alignment {alignment_num} of {key}: unresolved words");
        return Ok(None);
    };

    Ok(Some(AlignmentRecord {
        id: 0,
        book_id: key.book_id.clone(),
        chapter: key.chapter.clone(),
        verse: key.verse.clone(),
        alignment_num,
        orig_ids: orig_words.iter().map(|w| w.id).collect(),
        target_ids: target_words.iter().map(|w| w.id).collect(),
        orig_words,
        target_words,
    }))
}
