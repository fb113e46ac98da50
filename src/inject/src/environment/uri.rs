//! The URI contract of spec.md §6: resolving property-source locations
//! relative to the source that declared them.

use std::path::{Path, PathBuf};

use crate::injectable::{ConversionError, FromPropertyString};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    path: PathBuf,
}

impl Uri {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves `relative` against this URI's parent directory, the way an
    /// `include` directive resolves relative to its declaring source.
    pub fn resolve(&self, relative: &str) -> Uri {
        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        Uri::new(base.join(relative))
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn is_file(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_directory(&self) -> bool {
        self.path.is_dir()
    }
}

impl FromPropertyString for Uri {
    fn from_property_string(text: &str) -> Result<Self, ConversionError> {
        Ok(Uri::new(text.trim()))
    }
}
