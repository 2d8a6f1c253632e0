//! Source collection for codebase analysis.
//!
//! A [`CodebaseSnapshot`] is an ordered list of text files with paths
//! relative to the project root. Prompts never see the whole snapshot: a
//! [`CodebaseDigest`] carries the file summary plus a size-limited sample.

use draftwise_core::error::AiError;
use ignore::WalkBuilder;
use std::path::Path;

/// File extensions treated as readable source
pub const CODE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".cpp", ".c", ".h", ".cs", ".go", ".rs", ".rb",
    ".php", ".swift", ".kt", ".scala", ".json", ".yaml", ".yml", ".xml", ".sql", ".sh", ".md",
    ".txt",
];

/// Directory names never descended into
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    "venv",
    ".venv",
    "dist",
    "build",
];

/// Files listed in the summary
pub const SUMMARY_FILE_LIMIT: usize = 50;
/// Running budget of full file lengths kept in the sample
pub const SAMPLE_TOTAL_CHARS: usize = 50_000;
/// Per-file cap inside the sample
pub const SAMPLE_FILE_CHARS: usize = 5_000;
/// Per-file cap when a file is rendered into a prompt
pub const PROMPT_FILE_CHARS: usize = 2_000;

/// Whether a file name has one of the [`CODE_EXTENSIONS`]
pub fn is_code_file(name: &str) -> bool {
    CODE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the snapshot root, `/`-separated
    pub path: String,
    pub content: String,
}

/// Ordered collection of source files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodebaseSnapshot {
    files: Vec<SourceFile>,
}

impl CodebaseSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(path, content)` pairs, keeping their order.
    pub fn from_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(path, content)| SourceFile {
                    path: path.into(),
                    content: content.into(),
                })
                .collect(),
        }
    }

    /// Walk an extracted project directory.
    ///
    /// Only files passing [`is_code_file`] are read, [`EXCLUDED_DIRS`] are
    /// skipped, and files that are not valid UTF-8 or cannot be read are
    /// logged and left out. Paths are sorted so repeated runs see the same
    /// order.
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self, AiError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(AiError::invalid_request(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                let name = entry.file_name().to_string_lossy();
                !(is_dir && EXCLUDED_DIRS.contains(&name.as_ref()))
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !is_code_file(&name) {
                continue;
            }

            let path = entry.path();
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    let relative = path
                        .strip_prefix(root)
                        .unwrap_or(path)
                        .to_string_lossy()
                        .replace('\\', "/");
                    files.push(SourceFile {
                        path: relative,
                        content,
                    });
                }
                Err(e) => tracing::warn!("could not read {}: {}", path.display(), e),
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(root = %root.display(), files = files.len(), "collected sources");
        Ok(Self { files })
    }

    pub fn push(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.push(SourceFile {
            path: path.into(),
            content: content.into(),
        });
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// `File: <path>` / `Lines: <n>` for the first [`SUMMARY_FILE_LIMIT`] files
    pub fn file_summary(&self) -> String {
        self.files
            .iter()
            .take(SUMMARY_FILE_LIMIT)
            .map(|f| format!("File: {}\nLines: {}", f.path, f.content.lines().count()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Size-limited sample of the snapshot.
    ///
    /// Files are kept in order while the running total of their *full*
    /// lengths stays within [`SAMPLE_TOTAL_CHARS`]; the first file that would
    /// exceed it ends the sample. Each kept file is cut to
    /// [`SAMPLE_FILE_CHARS`].
    pub fn limited(&self) -> CodebaseSnapshot {
        let mut total = 0;
        let mut files = Vec::new();

        for file in &self.files {
            let len = file.content.chars().count();
            if total + len > SAMPLE_TOTAL_CHARS {
                break;
            }
            files.push(SourceFile {
                path: file.path.clone(),
                content: take_chars(&file.content, SAMPLE_FILE_CHARS).to_string(),
            });
            total += len;
        }

        CodebaseSnapshot { files }
    }

    /// Render the first `limit` files for a prompt, each cut to
    /// [`PROMPT_FILE_CHARS`].
    pub fn format_for_prompt(&self, limit: usize) -> String {
        self.files
            .iter()
            .take(limit)
            .map(|f| {
                format!(
                    "\n--- {} ---\n{}\n",
                    f.path,
                    take_chars(&f.content, PROMPT_FILE_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Summary and sample, computed once per analysis run.
    pub fn digest(&self) -> CodebaseDigest {
        CodebaseDigest {
            file_count: self.files.len(),
            summary: self.file_summary(),
            sample: self.limited(),
        }
    }
}

/// What the codebase prompts are built from
#[derive(Debug, Clone)]
pub struct CodebaseDigest {
    pub file_count: usize,
    pub summary: String,
    pub sample: CodebaseSnapshot,
}

/// Prefix of `text` holding at most `max_chars` characters
pub(crate) fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
