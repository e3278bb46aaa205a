//! Template identifier → file path resolution, confined to the base directory.
//!
//! Paths are normalized lexically (`.` dropped, `..` popped) *before* the
//! confinement check, and the normalized path is the one handed to the
//! filesystem. Checking one form and reading another would let
//! `pages/../../etc/passwd` slip through.

use std::path::{Component, Path, PathBuf};

use super::{DomainError, TemplateId};

/// Suffix of every layout file, independent of the configured extension.
pub const LAYOUT_EXTENSION: &str = ".html";

/// Maps template identifiers to paths below a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base: PathBuf,
    extension: String,
}

impl PathResolver {
    pub fn new(base: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            base: normalize(base.as_ref()),
            extension: extension.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `base/<id><extension>`, or [`DomainError::PathEscape`].
    pub fn resolve(&self, id: &TemplateId) -> Result<PathBuf, DomainError> {
        self.confine(id.as_str(), &self.extension)
    }

    /// Path of a layout declared by `child`: relative to the child's own
    /// directory, always with the `.html` suffix.
    pub fn resolve_layout(&self, child: &TemplateId, layout: &str) -> Result<PathBuf, DomainError> {
        let relative = join_logical(child.parent(), layout);
        self.confine(&relative, LAYOUT_EXTENSION)
    }

    fn confine(&self, relative: &str, extension: &str) -> Result<PathBuf, DomainError> {
        let mut joined = self.base.clone();
        let file = format!("{relative}{extension}");
        // Absolute identifiers land under the base instead of replacing it.
        for component in Path::new(&file).components() {
            match component {
                Component::Prefix(_) | Component::RootDir => {}
                other => joined.push(other.as_os_str()),
            }
        }

        let path = normalize(&joined);
        // Component-wise, relative to the base: a base may itself start
        // with `..`, but nothing below it may climb.
        let confined = path
            .strip_prefix(&self.base)
            .is_ok_and(|rest| !rest.components().any(|c| c == Component::ParentDir));
        if !confined {
            return Err(DomainError::PathEscape {
                path,
                base: self.base.clone(),
            });
        }
        Ok(path)
    }
}

/// Rewrite an include path relative to the directory of `from`.
///
/// A leading `/` does not re-root the include; it is joined like any other
/// relative path. The result is a logical identifier; it still goes through
/// [`PathResolver::resolve`] before anything is read.
pub fn include_identifier(from: &TemplateId, filename: &str) -> Result<TemplateId, DomainError> {
    TemplateId::new(normalize_logical(&join_logical(from.parent(), filename)))
}

fn join_logical(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Resolve `.`/`..` in a slash-separated identifier. Leading `..` that
/// cannot be popped are kept so the resolver can reject them.
fn normalize_logical(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Lexical normalization; does not touch the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
