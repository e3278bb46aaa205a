//! Value objects shared by every engine component.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::DomainError;

// ============================================================================
// Tag Delimiters
// ============================================================================

/// Open/close tag pair used to build every scan pattern.
///
/// Invariant: neither side is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagDelimiters {
    open: String,
    close: String,
}

impl TagDelimiters {
    pub const DEFAULT_OPEN: &'static str = "{{";
    pub const DEFAULT_CLOSE: &'static str = "}}";

    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self, DomainError> {
        let open = open.into();
        let close = close.into();
        if open.is_empty() || close.is_empty() {
            return Err(DomainError::InvalidDelimiters {
                reason: format!("open = {open:?}, close = {close:?}"),
            });
        }
        if open.chars().any(char::is_whitespace) || close.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidDelimiters {
                reason: "delimiters may not contain whitespace".into(),
            });
        }
        Ok(Self { open, close })
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }
}

impl Default for TagDelimiters {
    fn default() -> Self {
        Self {
            open: Self::DEFAULT_OPEN.into(),
            close: Self::DEFAULT_CLOSE.into(),
        }
    }
}

impl fmt::Display for TagDelimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} … {}", self.open, self.close)
    }
}

// ============================================================================
// Template Identifier
// ============================================================================

/// Logical, slash-separated template name (`"pages/home"`), not yet
/// resolved against the base directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() || id.contains('\0') {
            return Err(DomainError::InvalidIdentifier(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory part of the identifier (`"pages/home"` → `"pages"`).
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl FromStr for TemplateId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// File Encoding
// ============================================================================

/// Encoding used to decode template and layout files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl FileEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin1",
        }
    }

    /// Decode raw file bytes read from `path`.
    pub fn decode(&self, path: &Path, bytes: Vec<u8>) -> Result<String, DomainError> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|_| DomainError::Decode {
                path: path.to_path_buf(),
                encoding: self.as_str(),
            }),
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

impl FromStr for FileEncoding {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Self::Latin1),
            _ => Err(DomainError::UnsupportedEncoding(s.into())),
        }
    }
}

impl fmt::Display for FileEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Engine Options
// ============================================================================

/// Already-resolved configuration consumed by the engine.
///
/// The CLI (or any host) owns loading; the core only validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub base_dir: PathBuf,
    pub extension: String,
    pub encoding: FileEncoding,
    pub delimiters: TagDelimiters,
}

impl EngineOptions {
    pub const DEFAULT_EXTENSION: &'static str = ".html";

    /// Options with defaults for everything but the base directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            extension: Self::DEFAULT_EXTENSION.into(),
            encoding: FileEncoding::default(),
            delimiters: TagDelimiters::default(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_encoding(mut self, encoding: FileEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_delimiters(mut self, delimiters: TagDelimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let ext = &self.extension;
        if !ext.starts_with('.') || ext.len() < 2 || ext.contains('/') {
            return Err(DomainError::InvalidExtension(ext.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiters_reject_empty_sides() {
        assert!(TagDelimiters::new("", "}}").is_err());
        assert!(TagDelimiters::new("{{", "").is_err());
        assert!(TagDelimiters::new("<%", "%>").is_ok());
    }

    #[test]
    fn identifier_parent() {
        assert_eq!(TemplateId::new("pages/home").unwrap().parent(), "pages");
        assert_eq!(TemplateId::new("a/b/c").unwrap().parent(), "a/b");
        assert_eq!(TemplateId::new("index").unwrap().parent(), "");
    }

    #[test]
    fn identifier_rejects_blank() {
        assert!(TemplateId::new("").is_err());
        assert!(TemplateId::new("   ").is_err());
    }

    #[test]
    fn encoding_parses_aliases() {
        assert_eq!("UTF-8".parse::<FileEncoding>().unwrap(), FileEncoding::Utf8);
        assert_eq!("utf8".parse::<FileEncoding>().unwrap(), FileEncoding::Utf8);
        assert_eq!(
            "iso-8859-1".parse::<FileEncoding>().unwrap(),
            FileEncoding::Latin1
        );
        assert!("shift-jis".parse::<FileEncoding>().is_err());
    }

    #[test]
    fn latin1_maps_every_byte() {
        let text = FileEncoding::Latin1
            .decode(Path::new("x.html"), vec![b'c', 0xE9])
            .unwrap();
        assert_eq!(text, "cé");
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        let err = FileEncoding::Utf8
            .decode(Path::new("x.html"), vec![0xFF, 0xFE])
            .unwrap_err();
        assert!(matches!(err, DomainError::Decode { .. }));
    }

    #[test]
    fn options_validate_extension() {
        assert!(EngineOptions::new("/tpl").validate().is_ok());
        assert!(EngineOptions::new("/tpl").with_extension("html").validate().is_err());
        assert!(EngineOptions::new("/tpl").with_extension(".").validate().is_err());
    }
}
