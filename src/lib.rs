//! Concordia: word-level translation alignment extraction, indexing, and
//! query over SQLite.
//!
//! The pipeline reads two parallel resource trees: an original-language
//! text, and a target-language translation whose verses embed alignment
//! milestones. It turns them into four relational tables: word rows for
//! each side, resolved alignments, and an inverted index over
//! original-language surface forms.
//!
//! # Architecture
//!
//! ```text
//! chapter JSON ──▶ verse walker ──▶ word rows ──▶ store (SQLite)
//!                      │                             ▲
//!                      └──▶ alignment groups ──▶ resolver ──▶ alignments
//!                                                    │
//!                                                    └──▶ inverted index
//!
//! store ──▶ query layer ──▶ enriched alignments ──▶ export (JSON/CSV)
//! ```
//!
//! Builds are batch and single-threaded: one testament per pass, one book
//! at a time, each book deleted and reloaded wholesale so reruns are
//! idempotent. Per-node and per-alignment problems are logged and skipped;
//! only store and I/O failures abort a pass.
//!
//! # Example
//!
//! ```no_run
//! use concordia::config::AlignmentConfig;
//! use concordia::pipeline::build_alignments_for_testament;
//! use concordia::query::{query_alignments, QueryOptions};
//! use concordia::store::AlignmentDb;
//! use concordia::types::Testament;
//!
//! # fn main() -> concordia::error::Result<()> {
//! let config = AlignmentConfig::new(
//!     "alignments.sqlite",
//!     "resources/original",
//!     "resources/target",
//!     "training_data",
//! );
//! let mut db = AlignmentDb::open(&config.db_path)?;
//! build_alignments_for_testament(&mut db, &config, Testament::New)?;
//!
//! let rows = query_alignments(&db, &["λόγος"], &QueryOptions::default())?;
//! for row in &rows {
//!     println!("{}", row.alignment_txt);
//! }
//! # Ok(())
//! # }
//! ```

pub mod canon;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod resolve;
pub mod source;
pub mod store;
#[doc(hidden)]
pub mod testing;
pub mod types;
pub mod verse;

pub use config::AlignmentConfig;
pub use error::{Error, Result};
pub use pipeline::build_alignments_for_testament;
pub use query::{query_alignments, QueryOptions};
pub use store::AlignmentDb;
pub use types::{AlignmentRecord, EnrichedAlignment, IndexEntry, Side, Testament, WordRecord};
