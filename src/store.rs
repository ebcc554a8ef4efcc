//! SQLite-backed alignment store.
//!
//! Four logical tables (original words, target words, alignments, and the
//! inverted original-words index) plus `alignment_members`, the join table
//! that answers "which alignments contain word id X" with a real membership
//! query instead of substring matching on the rendered key strings.
//!
//! All writes go through prepared statements inside immediate transactions;
//! reads map rows straight into the typed records. There is no foreign-key
//! enforcement: integrity is maintained by the resolver's
//! resolve-or-reject policy.

use std::path::Path;

use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::error::Result;
use crate::types::{
    parse_bracketed_keys, AlignmentRecord, IndexEntry, Side, TableCounts, VerseKey, WordRecord,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS original_words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id TEXT NOT NULL,
    chapter TEXT NOT NULL,
    verse TEXT NOT NULL,
    word_num INTEGER NOT NULL,
    word TEXT NOT NULL,
    occurrence INTEGER NOT NULL,
    strong TEXT NOT NULL DEFAULT '',
    lemma TEXT NOT NULL DEFAULT '',
    morph TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_original_words_verse
    ON original_words(book_id, chapter, verse, word);
CREATE INDEX IF NOT EXISTS idx_original_words_lemma
    ON original_words(lemma);

CREATE TABLE IF NOT EXISTS target_words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id TEXT NOT NULL,
    chapter TEXT NOT NULL,
    verse TEXT NOT NULL,
    word_num INTEGER NOT NULL,
    word TEXT NOT NULL,
    occurrence INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_target_words_verse
    ON target_words(book_id, chapter, verse, word);

CREATE TABLE IF NOT EXISTS alignments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id TEXT NOT NULL,
    chapter TEXT NOT NULL,
    verse TEXT NOT NULL,
    alignment_num INTEGER NOT NULL,
    orig_lang_keys TEXT NOT NULL,
    target_lang_keys TEXT NOT NULL,
    orig_lang_words TEXT NOT NULL,
    target_lang_words TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alignments_book ON alignments(book_id);

CREATE TABLE IF NOT EXISTS alignment_members (
    alignment_id INTEGER NOT NULL,
    side TEXT NOT NULL,
    word_id INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alignment_members_word
    ON alignment_members(side, word_id);
CREATE INDEX IF NOT EXISTS idx_alignment_members_alignment
    ON alignment_members(alignment_id);

CREATE TABLE IF NOT EXISTS original_words_index (
    original_word TEXT PRIMARY KEY,
    lemma TEXT NOT NULL,
    strong TEXT NOT NULL,
    alignments TEXT NOT NULL,
    frequency TEXT NOT NULL DEFAULT ''
);
"#;

/// Which denormalized snapshot field a scan matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotField {
    Word,
    Lemma,
}

impl SnapshotField {
    fn json_key(self) -> &'static str {
        match self {
            SnapshotField::Word => "word",
            SnapshotField::Lemma => "lemma",
        }
    }
}

/// Handle over the backing SQLite database. Single writer; callers
/// serialize book-level reprocessing.
pub struct AlignmentDb {
    conn: Connection,
}

impl AlignmentDb {
    /// Open (creating if needed) a file-backed store and initialize the
    /// schema. Failure here is fatal to the pass.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let db = AlignmentDb { conn };
        db.init()?;
        info!("opened alignment store at {}", path.as_ref().display());
        Ok(db)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = AlignmentDb { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Word tables
    // ------------------------------------------------------------------

    /// Bulk-insert word rows for one side. Ids are assigned by the store;
    /// insertion order defines resolution order within a verse.
    pub fn insert_words(&mut self, side: Side, records: &[WordRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = match side {
                Side::Original => tx.prepare(
                    "INSERT INTO original_words
                         (book_id, chapter, verse, word_num, word, occurrence, strong, lemma, morph)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )?,
                Side::Target => tx.prepare(
                    "INSERT INTO target_words
                         (book_id, chapter, verse, word_num, word, occurrence)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?,
            };
            for record in records {
                match side {
                    Side::Original => stmt.execute(params![
                        record.book_id,
                        record.chapter,
                        record.verse,
                        record.word_num,
                        record.word,
                        record.occurrence,
                        record.strong,
                        record.lemma,
                        record.morph,
                    ])?,
                    Side::Target => stmt.execute(params![
                        record.book_id,
                        record.chapter,
                        record.verse,
                        record.word_num,
                        record.word,
                        record.occurrence,
                    ])?,
                };
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove all word rows of one side for a book, making reprocessing
    /// idempotent.
    pub fn delete_words_for_book(&self, side: Side, book_id: &str) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE book_id = ?1", side.table());
        Ok(self.conn.execute(&sql, params![book_id])?)
    }

    /// Exact-match lookup by (verse key, word, occurrence); the word
    /// resolver's backing query. Not-found is `None`, never an error.
    pub fn find_word_in_verse(
        &self,
        side: Side,
        word: &str,
        occurrence: i64,
        key: &VerseKey,
    ) -> Result<Option<WordRecord>> {
        let sql = format!(
            "SELECT {} FROM {}
             WHERE book_id = ?1 AND chapter = ?2 AND verse = ?3
               AND word = ?4 AND occurrence = ?5
             LIMIT 1",
            word_columns(side),
            side.table()
        );
        let found = self
            .conn
            .query_row(
                &sql,
                params![key.book_id, key.chapter, key.verse, word, occurrence],
                |row| word_from_row(row, side),
            )
            .optional()?;
        Ok(found)
    }

    /// All word rows of one verse, in emission order.
    pub fn words_for_verse(&self, side: Side, key: &VerseKey) -> Result<Vec<WordRecord>> {
        let sql = format!(
            "SELECT {} FROM {}
             WHERE book_id = ?1 AND chapter = ?2 AND verse = ?3
             ORDER BY word_num",
            word_columns(side),
            side.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![key.book_id, key.chapter, key.verse], |row| {
            word_from_row(row, side)
        })?;
        collect_rows(rows)
    }

    /// OR-combined lookup over a word list, by surface text or (original
    /// side only) by lemma, optionally case-insensitive and row-limited.
    pub fn find_words(
        &self,
        side: Side,
        words: &[&str],
        by_lemma: bool,
        case_insensitive: bool,
        max_rows: Option<usize>,
    ) -> Result<Vec<WordRecord>> {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        // The target table carries no lemma column.
        let column = if by_lemma && side == Side::Original {
            "lemma"
        } else {
            "word"
        };
        let collate = if case_insensitive {
            " COLLATE NOCASE"
        } else {
            ""
        };
        let predicates: Vec<String> = (1..=words.len())
            .map(|i| format!("({column} = ?{i}{collate})"))
            .collect();
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY id",
            word_columns(side),
            side.table(),
            predicates.join(" OR ")
        );
        if let Some(limit) = max_rows {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(words.iter()), |row| {
            word_from_row(row, side)
        })?;
        collect_rows(rows)
    }

    // ------------------------------------------------------------------
    // Alignment table
    // ------------------------------------------------------------------

    /// Persist one resolved alignment and its membership rows; returns the
    /// assigned id.
    pub fn insert_alignment(&mut self, record: &AlignmentRecord) -> Result<i64> {
        let orig_words_json = serde_json::to_string(&record.orig_words)?;
        let target_words_json = serde_json::to_string(&record.target_words)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO alignments
                 (book_id, chapter, verse, alignment_num,
                  orig_lang_keys, target_lang_keys, orig_lang_words, target_lang_words)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.book_id,
                record.chapter,
                record.verse,
                record.alignment_num,
                record.orig_lang_keys(),
                record.target_lang_keys(),
                orig_words_json,
                target_words_json,
            ],
        )?;
        let id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO alignment_members (alignment_id, side, word_id) VALUES (?1, ?2, ?3)",
            )?;
            for word_id in &record.orig_ids {
                stmt.execute(params![id, Side::Original.tag(), word_id])?;
            }
            for word_id in &record.target_ids {
                stmt.execute(params![id, Side::Target.tag(), word_id])?;
            }
        }
        tx.commit()?;
        Ok(id)
    }

    /// Remove all alignments (and membership rows) for a book.
    pub fn delete_alignments_for_book(&self, book_id: &str) -> Result<usize> {
        self.conn.execute(
            "DELETE FROM alignment_members WHERE alignment_id IN
                 (SELECT id FROM alignments WHERE book_id = ?1)",
            params![book_id],
        )?;
        Ok(self
            .conn
            .execute("DELETE FROM alignments WHERE book_id = ?1", params![book_id])?)
    }

    pub fn alignment_by_id(&self, id: i64) -> Result<Option<AlignmentRecord>> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT {ALIGNMENT_COLUMNS} FROM alignments WHERE id = ?1"),
                params![id],
                alignment_from_row,
            )
            .optional()?;
        Ok(found)
    }

    /// Membership query: all alignments containing a given word row,
    /// answered by the join table.
    pub fn alignments_containing_word(
        &self,
        side: Side,
        word_id: i64,
    ) -> Result<Vec<AlignmentRecord>> {
        let sql = format!(
            "SELECT {ALIGNMENT_COLUMNS} FROM alignments a
             JOIN alignment_members m ON m.alignment_id = a.id
             WHERE m.side = ?1 AND m.word_id = ?2
             ORDER BY a.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![side.tag(), word_id], alignment_from_row)?;
        collect_rows(rows)
    }

    /// Fallback scan: containment filter on a denormalized snapshot column.
    /// Used when no index covers the search (e.g. target-side text).
    pub fn alignments_with_snapshot_match(
        &self,
        side: Side,
        field: SnapshotField,
        value: &str,
    ) -> Result<Vec<AlignmentRecord>> {
        let column = match side {
            Side::Original => "orig_lang_words",
            Side::Target => "target_lang_words",
        };
        // Matches the compact serde_json rendering of the snapshot rows.
        let pattern = format!("%\"{}\":{}%", field.json_key(), serde_json::to_string(value)?);
        let sql = format!(
            "SELECT {ALIGNMENT_COLUMNS} FROM alignments WHERE {column} LIKE ?1 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern], alignment_from_row)?;
        collect_rows(rows)
    }

    // ------------------------------------------------------------------
    // Inverted index table
    // ------------------------------------------------------------------

    /// Upsert (replace-by-key) index entries; alignment-id sets are stored
    /// as JSON arrays.
    pub fn upsert_index_entries<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a IndexEntry>,
    ) -> Result<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                "REPLACE INTO original_words_index
                     (original_word, lemma, strong, alignments, frequency)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in entries {
                let alignments_json = serde_json::to_string(&entry.alignments)?;
                stmt.execute(params![
                    entry.original_word,
                    entry.lemma,
                    entry.strong,
                    alignments_json,
                    entry.frequency,
                ])?;
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Index entries whose surface word (or lemma) matches. Surface-word
    /// lookup returns at most one entry; lemma lookup may return several
    /// surface forms.
    pub fn index_entries_for(&self, word: &str, by_lemma: bool) -> Result<Vec<IndexEntry>> {
        let column = if by_lemma { "lemma" } else { "original_word" };
        let sql = format!(
            "SELECT original_word, lemma, strong, alignments, frequency
             FROM original_words_index WHERE {column} = ?1 ORDER BY original_word"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![word], |row| {
            let alignments_json: String = row.get(3)?;
            Ok(IndexEntry {
                original_word: row.get(0)?,
                lemma: row.get(1)?,
                strong: row.get(2)?,
                alignments: serde_json::from_str(&alignments_json).unwrap_or_default(),
                frequency: row.get(4)?,
            })
        })?;
        collect_rows(rows)
    }

    /// Distinct non-empty lemmas present in the index, in sorted order.
    /// Export discovery iterates this list.
    pub fn distinct_lemmas(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT lemma FROM original_words_index WHERE lemma != '' ORDER BY lemma",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        collect_rows(rows)
    }

    /// Row counts for post-build reporting.
    pub fn table_counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<i64> {
            Ok(self
                .conn
                .query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
        };
        Ok(TableCounts {
            original_words: count("original_words")?,
            target_words: count("target_words")?,
            alignments: count("alignments")?,
            index_entries: count("original_words_index")?,
        })
    }
}

const ALIGNMENT_COLUMNS: &str = "id, book_id, chapter, verse, alignment_num, \
     orig_lang_keys, target_lang_keys, orig_lang_words, target_lang_words";

fn word_columns(side: Side) -> &'static str {
    match side {
        Side::Original => "id, book_id, chapter, verse, word_num, word, occurrence, strong, lemma, morph",
        Side::Target => "id, book_id, chapter, verse, word_num, word, occurrence",
    }
}

fn word_from_row(row: &Row<'_>, side: Side) -> rusqlite::Result<WordRecord> {
    let (strong, lemma, morph) = match side {
        Side::Original => (row.get(7)?, row.get(8)?, row.get(9)?),
        Side::Target => (String::new(), String::new(), String::new()),
    };
    Ok(WordRecord {
        id: row.get(0)?,
        book_id: row.get(1)?,
        chapter: row.get(2)?,
        verse: row.get(3)?,
        word_num: row.get(4)?,
        word: row.get(5)?,
        occurrence: row.get(6)?,
        strong,
        lemma,
        morph,
    })
}

fn alignment_from_row(row: &Row<'_>) -> rusqlite::Result<AlignmentRecord> {
    let orig_keys: String = row.get(5)?;
    let target_keys: String = row.get(6)?;
    let orig_words_json: String = row.get(7)?;
    let target_words_json: String = row.get(8)?;
    Ok(AlignmentRecord {
        id: row.get(0)?,
        book_id: row.get(1)?,
        chapter: row.get(2)?,
        verse: row.get(3)?,
        alignment_num: row.get(4)?,
        orig_ids: parse_bracketed_keys(&orig_keys),
        target_ids: parse_bracketed_keys(&target_keys),
        orig_words: serde_json::from_str(&orig_words_json).unwrap_or_default(),
        target_words: serde_json::from_str(&target_words_json).unwrap_or_default(),
    })
}

fn collect_rows<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
