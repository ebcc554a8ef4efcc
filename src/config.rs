//! Immutable pipeline configuration.
//!
//! Built once per process invocation and passed by reference into each
//! component; nothing here is mutated after construction.

use std::path::{Path, PathBuf};

/// Paths and switches for one build/query/export run.
///
/// `original_lang_path` and `target_lang_path` point at resource trees laid
/// out as `{path}/{book_id}/{chapter}.json`.
#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Original-language (Greek/Hebrew) chapter JSON tree.
    pub original_lang_path: PathBuf,
    /// Target-language chapter JSON tree, nested alignment format.
    pub target_lang_path: PathBuf,
    /// Directory that receives training-data exports.
    pub training_data_dir: PathBuf,
    /// Lexicon content directory for Strong's-code lookups, if available.
    pub lexicon_path: Option<PathBuf>,
}

impl AlignmentConfig {
    pub fn new(
        db_path: impl Into<PathBuf>,
        original_lang_path: impl Into<PathBuf>,
        target_lang_path: impl Into<PathBuf>,
        training_data_dir: impl Into<PathBuf>,
    ) -> Self {
        AlignmentConfig {
            db_path: db_path.into(),
            original_lang_path: original_lang_path.into(),
            target_lang_path: target_lang_path.into(),
            training_data_dir: training_data_dir.into(),
            lexicon_path: None,
        }
    }

    pub fn with_lexicon_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lexicon_path = Some(path.into());
        self
    }

    /// Path of the export index document.
    pub fn export_index_path(&self) -> PathBuf {
        self.training_data_dir.join("index.json")
    }

    /// Path of one keyed export, with the given extension.
    pub fn export_path(&self, key: &str, extension: &str) -> PathBuf {
        self.training_data_dir.join(format!("{key}.{extension}"))
    }
}

impl AsRef<AlignmentConfig> for AlignmentConfig {
    fn as_ref(&self) -> &AlignmentConfig {
        self
    }
}

/// Convenience for tests and callers that keep everything under one root.
pub fn config_under(root: &Path) -> AlignmentConfig {
    AlignmentConfig::new(
        root.join("alignments.sqlite"),
        root.join("original"),
        root.join("target"),
        root.join("training_data"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_paths() {
        let cfg = config_under(Path::new("/tmp/x"));
        assert_eq!(
            cfg.export_path("grace", "csv"),
            PathBuf::from("/tmp/x/training_data/grace.csv")
        );
        assert_eq!(
            cfg.export_index_path(),
            PathBuf::from("/tmp/x/training_data/index.json")
        );
    }
}
