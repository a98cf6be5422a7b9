//! Filesystem/path helpers for static serving.

use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::error::StaticError;

/// A request path mapped onto the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    /// Lowercase, with the leading dot (`".css"`), or empty.
    pub extension: String,
}

/// Maps URL paths to files confined to a document root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    index: String,
}

impl PathResolver {
    /// `root` is made absolute (and canonical when it exists) up front so the
    /// prefix check compares like with like.
    pub fn new(root: impl AsRef<Path>, index: impl Into<String>) -> io::Result<Self> {
        let root = root.as_ref();
        let root = match std::fs::canonicalize(root) {
            Ok(canonical) => canonical,
            Err(_) => std::path::absolute(root)?,
        };
        Ok(Self {
            root,
            index: index.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path to an absolute file path within the root.
    pub fn resolve(&self, req_path: &str) -> Result<ResolvedPath, StaticError> {
        let req_path = strip_query(req_path);
        let decoded = percent_decode_str(req_path)
            .decode_utf8()
            .map_err(|_| StaticError::Forbidden)?;

        if decoded.contains('\0') || decoded.contains('\\') {
            return Err(StaticError::Forbidden);
        }

        let relative = if decoded.is_empty() || decoded == "/" {
            self.index.as_str()
        } else {
            decoded.as_ref()
        };

        let mut path = self.root.clone();
        let mut depth = 0usize;
        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if depth == 0 {
                        return Err(StaticError::Forbidden);
                    }
                    path.pop();
                    depth -= 1;
                }
                name => {
                    path.push(name);
                    depth += 1;
                }
            }
        }

        if !path.starts_with(&self.root) {
            return Err(StaticError::Forbidden);
        }

        let extension = extension_of(&path);
        Ok(ResolvedPath { path, extension })
    }

    /// Follow symlinks in an existing path and reject it if the real target
    /// is outside the root. Paths that do not exist are left to the read.
    pub async fn confine(&self, resolved: &ResolvedPath) -> Result<(), StaticError> {
        match tokio::fs::canonicalize(&resolved.path).await {
            Ok(real) if !real.starts_with(&self.root) => Err(StaticError::Forbidden),
            _ => Ok(()),
        }
    }
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
