//! Artifact module - keys for uploaded source documents
//!
//! An artifact is addressed by a key derived from the filename the user chose.
//! Keys are disambiguated with a high-resolution timestamp so concurrent
//! uploads of `report.pdf` land under different names, while the original base
//! name and extension stay readable.

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fallback base name when the user-supplied one sanitizes to nothing
const FALLBACK_BASE: &str = "upload";

/// Upper bound on key length accepted from the outside world
const MAX_KEY_LEN: usize = 1024;

/// Errors raised while deriving or validating an artifact key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The filename or key was empty
    #[error("artifact name is empty")]
    Empty,

    /// The key contains characters unsafe for the target storage system
    #[error("unsafe artifact key: {0}")]
    Unsafe(String),
}

/// Key of an artifact inside its bucket
///
/// Only ASCII alphanumerics, `_`, `-` and `.` are allowed, and a key never
/// starts with a dot. This keeps keys valid as object names and as plain file
/// names (no path traversal through `..`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Validate an existing key (e.g. one received in a trigger event)
    ///
    /// # Examples
    ///
    /// ```
    /// use intake_domain::ArtifactKey;
    ///
    /// let key = ArtifactKey::parse("report_20250301093000123456.pdf").unwrap();
    /// assert_eq!(key.extension(), Some("pdf"));
    /// assert!(ArtifactKey::parse("../etc/passwd").is_err());
    /// ```
    pub fn parse(value: impl Into<String>) -> Result<Self, KeyError> {
        let value = value.into();
        if value.is_empty() {
            return Err(KeyError::Empty);
        }
        if value.len() > MAX_KEY_LEN
            || value.starts_with('.')
            || !value.chars().all(is_key_char)
        {
            return Err(KeyError::Unsafe(value));
        }
        Ok(Self(value))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key without its extension
    pub fn stem(&self) -> &str {
        split_extension(&self.0).0
    }

    /// Extension without the leading dot, if any
    pub fn extension(&self) -> Option<&str> {
        let ext = split_extension(&self.0).1;
        ext.strip_prefix('.').filter(|e| !e.is_empty())
    }

    /// Document kind implied by the extension
    pub fn kind(&self) -> Option<DocumentKind> {
        self.extension().and_then(DocumentKind::from_extension)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtifactKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ArtifactKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ArtifactKey> for String {
    fn from(key: ArtifactKey) -> Self {
        key.0
    }
}

/// Document types accepted by the upload surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// PDF document
    Pdf,
    /// PNG image
    Png,
    /// JPEG image (`.jpg` or `.jpeg`)
    Jpeg,
}

impl DocumentKind {
    /// Resolve a kind from an extension (case-insensitive, no leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" => Some(DocumentKind::Png),
            "jpg" | "jpeg" => Some(DocumentKind::Jpeg),
            _ => None,
        }
    }

    /// Resolve a kind from a filename or path
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = split_extension(file_name(name));
        ext.strip_prefix('.').and_then(Self::from_extension)
    }

    /// MIME type sent to the document-understanding service
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Png => "image/png",
            DocumentKind::Jpeg => "image/jpeg",
        }
    }

    /// Canonical extension
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Png => "png",
            DocumentKind::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives collision-resistant artifact keys from user filenames
///
/// The key is `<base>_<YYYYMMDDHHMMSSffffff><.ext>` in UTC. Two uploads inside
/// the same microsecond can still collide; uniqueness is eventual, not
/// guaranteed.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use intake_domain::{FixedClock, NameDisambiguator};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
/// let namer = NameDisambiguator::new(FixedClock::new(t0));
/// let key = namer.disambiguate("report.pdf").unwrap();
/// assert_eq!(key.as_str(), "report_20250301093000000000.pdf");
/// ```
#[derive(Debug, Clone, Default)]
pub struct NameDisambiguator<C = SystemClock> {
    clock: C,
}

impl<C: Clock> NameDisambiguator<C> {
    /// Create a disambiguator reading time from `clock`
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Derive a key for `filename` at the current clock instant
    pub fn disambiguate(&self, filename: &str) -> Result<ArtifactKey, KeyError> {
        disambiguate_at(filename, self.clock.now())
    }
}

/// Derive a key for `filename` at a given instant
pub fn disambiguate_at(filename: &str, at: DateTime<Utc>) -> Result<ArtifactKey, KeyError> {
    let name = file_name(filename.trim());
    if name.is_empty() {
        return Err(KeyError::Empty);
    }

    let (base, ext) = split_extension(name);
    let base = sanitize(base);
    let base = base.trim_start_matches('.');
    let base = if base.is_empty() { FALLBACK_BASE } else { base };

    let timestamp = at.format("%Y%m%d%H%M%S%6f");
    ArtifactKey::parse(format!("{}_{}{}", base, timestamp, sanitize(ext)))
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if is_key_char(c) { c } else { '_' })
        .collect()
}

/// Last path component, accepting both separators
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Split off the last extension, ignoring leading dots (`.env` has none)
fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(idx) => name.split_at(leading + idx),
        None => (name, ""),
    }
}
