//! End-to-end tests: resource tree → build → query → export, on disk.

use serde_json::json;

use concordia::config::config_under;
use concordia::export::export_training_data;
use concordia::pipeline::build_alignments_for_testament;
use concordia::query::{query_alignments, QueryOptions};
use concordia::store::AlignmentDb;
use concordia::testing::{milestone_json, orig_word_json, target_word_json, write_chapter};
use concordia::types::{Side, Testament};

/// John 1:1-style fixture: repeated target words, one lemma with two surface
/// forms across verses.
fn john_fixture(root: &std::path::Path) {
    write_chapter(
        root.join("original").as_path(),
        "jhn",
        "1",
        &json!({
            "1": { "verseObjects": [
                orig_word_json("λόγος", 1, "G3056", "λόγος"),
                orig_word_json("θεός", 1, "G2316", "θεός"),
            ]},
            "14": { "verseObjects": [
                orig_word_json("λόγος", 1, "G3056", "λόγος"),
            ]},
        }),
    );
    write_chapter(
        root.join("target").as_path(),
        "jhn",
        "1",
        &json!({
            "1": { "verseObjects": [
                milestone_json("λόγος", 1, vec![
                    target_word_json("the", 1),
                    target_word_json("word", 1),
                ]),
                milestone_json("θεός", 1, vec![
                    target_word_json("the", 2),
                    target_word_json("God", 1),
                ]),
            ]},
            "14": { "verseObjects": [
                milestone_json("λόγος", 1, vec![
                    target_word_json("the", 1),
                    target_word_json("word", 1),
                ]),
            ]},
        }),
    );
}

#[test]
fn test_end_to_end_build_and_query() {
    let dir = tempfile::tempdir().unwrap();
    john_fixture(dir.path());
    let config = config_under(dir.path());

    let mut db = AlignmentDb::open(&config.db_path).unwrap();
    let summary = build_alignments_for_testament(&mut db, &config, Testament::New).unwrap();
    assert_eq!(summary.books, 1);
    assert_eq!(summary.verses, 2);
    assert_eq!(summary.alignments_saved, 3);
    assert_eq!(summary.alignments_skipped, 0);

    // Repeated "the" rows got distinct occurrences within the verse.
    let key = concordia::types::VerseKey::new("jhn", "1", "1");
    let the_2 = db.find_word_in_verse(Side::Target, "the", 2, &key).unwrap();
    assert!(the_2.is_some());

    // Original-side query through the index.
    let rows = query_alignments(&db, &["λόγος"], &QueryOptions::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.alignment_txt == "λόγος = the word"));
    assert_eq!(rows[0].match_count, 2);
    assert!((rows[0].frequency - 1.0).abs() < 1e-9);

    // Target-side query through the membership table.
    let options = QueryOptions {
        search_original: false,
        ..Default::default()
    };
    let by_target = query_alignments(&db, &["God"], &options).unwrap();
    assert_eq!(by_target.len(), 1);
    assert_eq!(by_target[0].orig_words_txt, "θεός");
}

#[test]
fn test_index_covers_every_saved_alignment() {
    let dir = tempfile::tempdir().unwrap();
    john_fixture(dir.path());
    let config = config_under(dir.path());

    let mut db = AlignmentDb::open(&config.db_path).unwrap();
    build_alignments_for_testament(&mut db, &config, Testament::New).unwrap();

    // Every alignment found through the membership table must also be
    // reachable through the index entry of each original word it contains.
    for word in ["λόγος", "θεός"] {
        let entries = db.index_entries_for(word, false).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(!entry.alignments.is_empty());
        for &id in &entry.alignments {
            let record = db.alignment_by_id(id).unwrap().unwrap();
            assert!(record.orig_words.iter().any(|w| w.word == word));
        }
    }
}

#[test]
fn test_rebuild_then_query_sees_one_copy() {
    let dir = tempfile::tempdir().unwrap();
    john_fixture(dir.path());
    let config = config_under(dir.path());

    let mut db = AlignmentDb::open(&config.db_path).unwrap();
    build_alignments_for_testament(&mut db, &config, Testament::New).unwrap();
    build_alignments_for_testament(&mut db, &config, Testament::New).unwrap();

    let rows = query_alignments(&db, &["λόγος"], &QueryOptions::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(db.table_counts().unwrap().alignments, 3);
}

#[test]
fn test_export_from_built_store() {
    let dir = tempfile::tempdir().unwrap();
    john_fixture(dir.path());
    let config = config_under(dir.path());

    let mut db = AlignmentDb::open(&config.db_path).unwrap();
    build_alignments_for_testament(&mut db, &config, Testament::New).unwrap();

    let summary = export_training_data(&db, &config, "john", &[], -1.0, true).unwrap();
    assert_eq!(summary.keys, 2);
    assert_eq!(summary.rows, 3);

    let index: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(config.export_index_path()).unwrap())
            .unwrap();
    assert_eq!(index["λόγος"]["alignmentsCount"], 2);
    assert_eq!(index["θεός"]["alignmentsCount"], 1);
    assert_eq!(index["john"]["alignmentsCount"], 3);
    assert_eq!(index["john"]["lemmaList"].as_array().unwrap().len(), 2);

    let logos: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(config.export_path("λόγος", "json")).unwrap(),
    )
    .unwrap();
    assert_eq!(logos["λόγος"].as_array().unwrap().len(), 2);
}

#[test]
fn test_lemma_query_spans_surface_forms() {
    let dir = tempfile::tempdir().unwrap();
    // Two surface forms of one lemma in different verses.
    write_chapter(
        dir.path().join("original").as_path(),
        "tit",
        "1",
        &json!({
            "1": { "verseObjects": [ orig_word_json("λόγος", 1, "G3056", "λόγος") ]},
            "2": { "verseObjects": [ orig_word_json("λόγον", 1, "G3056", "λόγος") ]},
        }),
    );
    write_chapter(
        dir.path().join("target").as_path(),
        "tit",
        "1",
        &json!({
            "1": { "verseObjects": [
                milestone_json("λόγος", 1, vec![target_word_json("word", 1)]),
            ]},
            "2": { "verseObjects": [
                milestone_json("λόγον", 1, vec![target_word_json("message", 1)]),
            ]},
        }),
    );
    let config = config_under(dir.path());
    let mut db = AlignmentDb::open(&config.db_path).unwrap();
    build_alignments_for_testament(&mut db, &config, Testament::New).unwrap();

    let options = QueryOptions {
        search_lemma: true,
        ..Default::default()
    };
    let rows = query_alignments(&db, &["λόγος"], &options).unwrap();
    assert_eq!(rows.len(), 2);
    let mut texts: Vec<&str> = rows.iter().map(|r| r.orig_words_txt.as_str()).collect();
    texts.sort_unstable();
    assert_eq!(texts, vec!["λόγον", "λόγος"]);
}
