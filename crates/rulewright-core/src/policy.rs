//! Policy document corpus.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CREDIT_POLICY: &str = "Credit Policy v1.0
- Minimum bureau score for approval should normally be 600 or above.
- Applicants with bureau score below 550 should usually be rejected.
- Overdue amount greater than 50,000 should be treated as high risk.
";

const INCOME_POLICY: &str = "Income Policy v1.0
- FOIR should ideally be below 0.6 (60%).
- Debt to income ratio above 0.8 is considered high risk.
- Monthly income above 100,000 may qualify for premium offers.
";

/// Errors that can occur when loading policy documents from disk.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Failed to read policy directory {}: {source}", .path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("Failed to read policy document {}: {source}", .path.display())]
    ReadDocument { path: PathBuf, source: io::Error },
}

/// File extensions picked up by [`PolicyCorpus::from_dir`].
const POLICY_EXTENSIONS: &[&str] = &["txt", "md"];

/// Ordered collection of free-text policy documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyCorpus {
    documents: Vec<String>,
}

impl PolicyCorpus {
    /// The two credit and income policy documents shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_documents([CREDIT_POLICY, INCOME_POLICY])
    }

    pub fn from_documents<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            documents: documents.into_iter().map(Into::into).collect(),
        }
    }

    /// Load every `.txt` and `.md` file in `dir`, ordered by file name.
    ///
    /// Blank files are skipped. Subdirectories are not searched.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let dir = dir.as_ref();
        let read_dir_error = |source| PolicyError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir_error)? {
            let path = entry.map_err(read_dir_error)?.path();
            let wanted = path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        POLICY_EXTENSIONS
                            .iter()
                            .any(|want| ext.eq_ignore_ascii_case(want))
                    });
            if wanted {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(source) => return Err(PolicyError::ReadDocument { path, source }),
            };
            if text.trim().is_empty() {
                tracing::debug!(path = %path.display(), "skipping empty policy file");
                continue;
            }
            documents.push(text);
        }

        tracing::debug!(documents = documents.len(), "loaded policy directory");
        Ok(Self { documents })
    }

    /// This corpus followed by `extra`, in that order.
    pub fn with_extra(&self, extra: &[String]) -> Self {
        let mut documents = self.documents.clone();
        documents.extend(extra.iter().cloned());
        Self { documents }
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_corpus() {
        let corpus = PolicyCorpus::builtin();
        assert_eq!(corpus.len(), 2);
        assert!(corpus.documents()[0].starts_with("Credit Policy v1.0"));
        assert!(corpus.documents()[1].contains("FOIR should ideally be below 0.6"));
    }

    #[test]
    fn test_with_extra_appends() {
        let corpus = PolicyCorpus::builtin().with_extra(&["LTV above 0.9 is high risk".to_string()]);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.documents()[2], "LTV above 0.9 is high risk");
    }

    #[test]
    fn test_from_dir_sorted_and_filtered() {
        let dir = std::env::temp_dir().join(format!("rulewright-policy-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.md"), "Second policy").unwrap();
        fs::write(dir.join("a.txt"), "First policy").unwrap();
        fs::write(dir.join("c.json"), "{}").unwrap();
        fs::write(dir.join("d.txt"), "   \n").unwrap();

        let corpus = PolicyCorpus::from_dir(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(corpus.documents(), &["First policy", "Second policy"]);
    }

    #[test]
    fn test_from_missing_dir_names_the_path() {
        let err = PolicyCorpus::from_dir("/definitely/not/a/policy/dir").unwrap_err();
        assert!(matches!(err, PolicyError::ReadDir { ref path, .. }
            if path == Path::new("/definitely/not/a/policy/dir")));
        assert!(err.to_string().contains("/definitely/not/a/policy/dir"));
    }

    #[test]
    fn test_unreadable_document_names_the_file() {
        let dir = std::env::temp_dir().join(format!("rulewright-policy-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("binary.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let err = PolicyCorpus::from_dir(&dir).unwrap_err();
        fs::remove_dir_all(&dir).unwrap();

        match err {
            PolicyError::ReadDocument { path, .. } => assert!(path.ends_with("binary.txt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
