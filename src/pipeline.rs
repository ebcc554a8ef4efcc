//! Batch build pass: walk one testament's resources into the store.
//!
//! Processing is book-at-a-time and single-threaded. Each book is deleted
//! and reloaded wholesale, so rerunning a build over the same resources
//! leaves equivalent contents. The inverted index accumulates in memory
//! across the whole testament and is flushed once at the end.

use log::{debug, info};

use crate::canon;
use crate::config::AlignmentConfig;
use crate::error::Result;
use crate::index::AlignmentsIndex;
use crate::resolve::resolve_alignment;
use crate::source::{numeric_verses, verse_objects, ChapterSource, ChapterVerses};
use crate::store::AlignmentDb;
use crate::types::{Side, Testament, VerseKey};
use crate::verse::{alignments_from_verse, word_records_for_verse, words_from_verse, VerseNode};

/// What one build pass did, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub books: usize,
    pub verses: usize,
    pub alignments_saved: usize,
    pub alignments_skipped: usize,
    pub index_entries: usize,
}

/// Build word tables, alignments, and the inverted index for every book of
/// a testament present in the target-language resource tree.
pub fn build_alignments_for_testament(
    db: &mut AlignmentDb,
    config: &AlignmentConfig,
    testament: Testament,
) -> Result<BuildSummary> {
    let original = ChapterSource::new(&config.original_lang_path);
    let target = ChapterSource::new(&config.target_lang_path);

    let mut index = AlignmentsIndex::new();
    let mut summary = BuildSummary::default();

    for book in canon::books(testament) {
        if !target.has_book(book.id) {
            debug!("build - no target resources for {}, skipping", book.id);
            continue;
        }
        info!("build - processing {}", book.id);
        build_book(db, &original, &target, book.id, &mut index, &mut summary)?;
        summary.books += 1;
    }

    summary.index_entries = index.flush(db)?;
    info!(
        "build - {testament}: {} books, {} verses, {} alignments saved, {} skipped, {} index entries",
        summary.books,
        summary.verses,
        summary.alignments_saved,
        summary.alignments_skipped,
        summary.index_entries
    );
    Ok(summary)
}

fn build_book(
    db: &mut AlignmentDb,
    original: &ChapterSource,
    target: &ChapterSource,
    book_id: &str,
    index: &mut AlignmentsIndex,
    summary: &mut BuildSummary,
) -> Result<()> {
    // Reprocessing a book replaces its rows entirely.
    db.delete_words_for_book(Side::Original, book_id)?;
    db.delete_words_for_book(Side::Target, book_id)?;
    db.delete_alignments_for_book(book_id)?;

    for chapter in canon::chapters(book_id)? {
        let Some(target_verses) = target.load_chapter(book_id, &chapter)? else {
            continue;
        };
        let original_verses = original.load_chapter(book_id, &chapter)?;

        for verse in numeric_verses(&target_verses) {
            let key = VerseKey::new(book_id, &chapter, &verse);
            build_verse(db, &key, original_verses.as_ref(), &target_verses, index, summary)?;
            summary.verses += 1;
        }
    }
    Ok(())
}

fn build_verse(
    db: &mut AlignmentDb,
    key: &VerseKey,
    original_verses: Option<&ChapterVerses>,
    target_verses: &ChapterVerses,
    index: &mut AlignmentsIndex,
    summary: &mut BuildSummary,
) -> Result<()> {
    // Original-language words first: alignment resolution looks them up.
    if let Some(verses) = original_verses {
        let nodes = verse_objects(verses, &key.verse);
        let words = words_from_verse(&nodes);
        let records = word_records_for_verse(&words, key, Side::Original);
        db.insert_words(Side::Original, &records)?;
    }

    let nodes = verse_objects(target_verses, &key.verse);
    let (target_words, groups) = alignments_from_verse(&nodes);
    let refs: Vec<&VerseNode> = target_words.iter().collect();
    let records = word_records_for_verse(&refs, key, Side::Target);
    db.insert_words(Side::Target, &records)?;

    for (alignment_num, group) in groups.iter().enumerate() {
        match resolve_alignment(db, group, key, alignment_num as i64)? {
            Some(mut record) => {
                record.id = db.insert_alignment(&record)?;
                index.add_alignment(&record);
                summary.alignments_saved += 1;
            }
            None => summary.alignments_skipped += 1,
        }
    }
    Ok(())
}
