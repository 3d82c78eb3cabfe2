use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// In-memory byte-span replacement with before-text verification.
///
/// Every patch step compiles down to one splice. Locators find the span,
/// the splice only checks that the span still holds what the locator saw.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Splice does nothing until apply() is called"]
pub struct Splice {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Text that replaces [byte_start, byte_end)
    pub new_text: String,
    /// What we expect to find in the span before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at byte {byte_start}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("byte offset {0} is not on a UTF-8 character boundary")]
    NotCharBoundary(usize),

    #[error("{0} changed on disk since it was read")]
    ConcurrentModification(PathBuf),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Splice {
    /// Replace `span_text`, found at `byte_start`, with `new_text`.
    pub fn replace(byte_start: usize, span_text: &str, new_text: impl Into<String>) -> Self {
        Self {
            byte_start,
            byte_end: byte_start + span_text.len(),
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(span_text),
        }
    }

    /// Insert `text` in front of the anchor found at `anchor_start`.
    ///
    /// The anchor becomes the verified span, so a stale offset cannot
    /// silently insert into the wrong place.
    pub fn insert_before(anchor_start: usize, anchor: &str, text: &str) -> Self {
        Self::replace(anchor_start, anchor, format!("{text}{anchor}"))
    }

    /// Insert `text` right after the anchor found at `anchor_start`.
    pub fn insert_after(anchor_start: usize, anchor: &str, text: &str) -> Self {
        Self::replace(anchor_start, anchor, format!("{anchor}{text}"))
    }

    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: content.len(),
            });
        }
        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }

        let current = &content[self.byte_start..self.byte_end];
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }
        Ok(current)
    }

    /// Apply the splice to `content`, returning the new text.
    pub fn apply(&self, content: &str) -> Result<String, EditError> {
        self.validate(content)?;

        let mut out = String::with_capacity(
            content.len() + self.new_text.len() - (self.byte_end - self.byte_start),
        );
        out.push_str(&content[..self.byte_start]);
        out.push_str(&self.new_text);
        out.push_str(&content[self.byte_end..]);
        Ok(out)
    }
}

/// Whole-file replacement guarded by the contents seen at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileRewrite does nothing until apply() is called"]
pub struct FileRewrite {
    pub file: PathBuf,
    pub expected_before: EditVerification,
    pub new_content: String,
}

/// Result of applying a file rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for success/already-applied"]
pub enum EditResult {
    /// File was rewritten
    Applied { file: PathBuf, bytes_written: usize },
    /// File already held the new content
    AlreadyApplied { file: PathBuf },
}

impl FileRewrite {
    pub fn new(
        file: impl Into<PathBuf>,
        original: &str,
        new_content: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            expected_before: EditVerification::from_text(original),
            new_content: new_content.into(),
        }
    }

    /// Write the new content atomically.
    ///
    /// Uses tempfile + fsync + rename for crash safety, then bumps the
    /// mtime so Xcode picks the change up on incremental builds.
    pub fn apply(&self) -> Result<EditResult, EditError> {
        let current = String::from_utf8(fs::read(&self.file)?)?;

        if current == self.new_content {
            return Ok(EditResult::AlreadyApplied {
                file: self.file.clone(),
            });
        }

        if !self.expected_before.matches(&current) {
            return Err(EditError::ConcurrentModification(self.file.clone()));
        }

        atomic_write(&self.file, self.new_content.as_bytes())?;

        let now = filetime::FileTime::now();
        filetime::set_file_mtime(&self.file, now)?;

        Ok(EditResult::Applied {
            file: self.file.clone(),
            bytes_written: self.new_content.len(),
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Same directory keeps the rename on one filesystem
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
