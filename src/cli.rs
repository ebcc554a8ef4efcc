//! Command-line interface: build, query, export, stats, lexicon.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use crate::config::AlignmentConfig;
use crate::error::{Error, Result};
use crate::export::export_training_data;
use crate::pipeline::build_alignments_for_testament;
use crate::query::{filter_alignments, query_alignments, QueryOptions};
use crate::source::lookup_lexicon;
use crate::store::AlignmentDb;
use crate::types::Testament;

#[derive(Parser, Debug)]
#[command(
    name = "concordia",
    version,
    about = "Word-level translation alignment extraction, indexing, and query"
)]
pub struct Cli {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    /// SQLite database file
    #[arg(long, default_value = "alignments.sqlite")]
    pub db: PathBuf,

    /// Original-language resource tree ({path}/{book}/{chapter}.json)
    #[arg(long, default_value = "resources/original")]
    pub original: PathBuf,

    /// Target-language resource tree ({path}/{book}/{chapter}.json)
    #[arg(long, default_value = "resources/target")]
    pub target: PathBuf,

    /// Output directory for training-data exports
    #[arg(long, default_value = "training_data")]
    pub output: PathBuf,

    /// Lexicon content directory for Strong's-code lookups
    #[arg(long)]
    pub lexicon: Option<PathBuf>,
}

impl PathArgs {
    fn to_config(&self) -> AlignmentConfig {
        let config = AlignmentConfig::new(&self.db, &self.original, &self.target, &self.output);
        match &self.lexicon {
            Some(path) => config.with_lexicon_path(path),
            None => config,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TestamentArg {
    Ot,
    Nt,
}

impl From<TestamentArg> for Testament {
    fn from(arg: TestamentArg) -> Self {
        match arg {
            TestamentArg::Ot => Testament::Old,
            TestamentArg::Nt => Testament::New,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk one testament's resources into the store and rebuild its index
    Build {
        /// Which testament to process
        #[arg(value_enum)]
        testament: TestamentArg,
    },

    /// Print enriched alignments for one or more words as JSON
    Query {
        /// Words to search for
        #[arg(required = true)]
        words: Vec<String>,

        /// Search target-language words instead of original-language ones
        #[arg(long)]
        target: bool,

        /// Match on lemma instead of surface text
        #[arg(long)]
        lemma: bool,

        /// Fold case for target-language matches
        #[arg(long)]
        ignore_case: bool,

        /// Cap on matched target word rows
        #[arg(long)]
        max_rows: Option<usize>,

        /// Inclusive threshold on match_count/frequency; negative accepts all
        #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
        min_alignments: f64,

        /// Keep tokenized possessives as separate words
        #[arg(long)]
        no_merge_possessive: bool,
    },

    /// Export per-lemma training data (JSON + CSV + index.json)
    Export {
        /// Words to export; empty exports every indexed lemma
        words: Vec<String>,

        /// Key for the combined export documents
        #[arg(long, default_value = "alignments")]
        key: String,

        /// Inclusive threshold on match_count/frequency; negative accepts all
        #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
        min_alignments: f64,

        /// Keep tokenized possessives as separate words
        #[arg(long)]
        no_merge_possessive: bool,
    },

    /// Print row counts for every table
    Stats,

    /// Print the lexicon entry for a Strong's code (e.g. G3056)
    Lexicon {
        /// Strong's code
        strong: String,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.paths.to_config();
    match cli.command {
        Command::Build { testament } => {
            let mut db = AlignmentDb::open(&config.db_path)?;
            let summary = build_alignments_for_testament(&mut db, &config, testament.into())?;
            println!(
                "{} books, {} verses, {} alignments saved, {} skipped, {} index entries",
                summary.books,
                summary.verses,
                summary.alignments_saved,
                summary.alignments_skipped,
                summary.index_entries
            );
            Ok(())
        }
        Command::Query {
            words,
            target,
            lemma,
            ignore_case,
            max_rows,
            min_alignments,
            no_merge_possessive,
        } => {
            let db = AlignmentDb::open(&config.db_path)?;
            let options = QueryOptions {
                search_original: !target,
                search_lemma: lemma,
                case_insensitive: ignore_case,
                max_rows,
                merge_possessive: !no_merge_possessive,
            };
            let refs: Vec<&str> = words.iter().map(String::as_str).collect();
            let rows = filter_alignments(query_alignments(&db, &refs, &options)?, min_alignments);
            info!("query - {} alignments after filtering", rows.len());
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
        Command::Export {
            words,
            key,
            min_alignments,
            no_merge_possessive,
        } => {
            let db = AlignmentDb::open(&config.db_path)?;
            let refs: Vec<&str> = words.iter().map(String::as_str).collect();
            let summary = export_training_data(
                &db,
                &config,
                &key,
                &refs,
                min_alignments,
                !no_merge_possessive,
            )?;
            println!(
                "wrote {} lemmas ({} rows) to {}",
                summary.keys,
                summary.rows,
                config.training_data_dir.display()
            );
            Ok(())
        }
        Command::Stats => {
            let db = AlignmentDb::open(&config.db_path)?;
            let counts = db.table_counts()?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
            Ok(())
        }
        Command::Lexicon { strong } => {
            let lexicon_path = config
                .lexicon_path
                .as_deref()
                .ok_or_else(|| Error::MissingSource(PathBuf::from("--lexicon")))?;
            match lookup_lexicon(lexicon_path, &strong)? {
                Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                None => println!("null"),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_subcommand() {
        let cli = Cli::parse_from(["concordia", "--db", "/tmp/x.sqlite", "build", "nt"]);
        assert!(matches!(
            cli.command,
            Command::Build {
                testament: TestamentArg::Nt
            }
        ));
        assert_eq!(cli.paths.db, PathBuf::from("/tmp/x.sqlite"));
    }

    #[test]
    fn test_query_flags() {
        let cli = Cli::parse_from([
            "concordia",
            "query",
            "--target",
            "--ignore-case",
            "--min-alignments",
            "2.5",
            "word",
        ]);
        match cli.command {
            Command::Query {
                words,
                target,
                ignore_case,
                min_alignments,
                ..
            } => {
                assert_eq!(words, vec!["word"]);
                assert!(target);
                assert!(ignore_case);
                assert!((min_alignments - 2.5).abs() < 1e-9);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
