//! Offline IRI redirection
//!
//! Reads a two-column text file, one `remote-iri,local-path` pair per line,
//! that points imported ontology IRIs at local copies. A missing or broken
//! file never fails a run; redirection is simply not applied.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::Diagnostics;

/// Well-known file name looked up in the working directory
pub const DEFAULT_IRI_MAPPINGS: &str = "iri_mappings.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IriMappings {
    entries: BTreeMap<String, PathBuf>,
}

impl IriMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load mappings from `path`, recording problems in `diagnostics`
    pub fn load<P: AsRef<Path>>(path: P, diagnostics: &mut Diagnostics) -> Self {
        let path = path.as_ref();
        let subject = path.display().to_string();

        if !path.exists() {
            diagnostics.info(subject, "Did not find IRI mappings file, redirection disabled");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => {
                let mappings = Self::parse(&content, &subject, diagnostics);
                for (iri, local) in &mappings.entries {
                    tracing::info!("Loaded IRI mapping {} -> {}", iri, local.display());
                }
                mappings
            }
            Err(e) => {
                diagnostics.warn(
                    subject,
                    format!("There was a problem loading IRI mappings, redirection disabled: {}", e),
                );
                Self::default()
            }
        }
    }

    /// Parse mapping lines. Blank lines and `#` comments are ignored,
    /// malformed lines are skipped with a warning.
    pub fn parse(content: &str, source: &str, diagnostics: &mut Diagnostics) -> Self {
        let mut entries = BTreeMap::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            match parts.as_slice() {
                [iri, local] if !iri.is_empty() && !local.is_empty() => {
                    entries.insert(iri.to_string(), PathBuf::from(local));
                }
                _ => diagnostics.warn(
                    format!("{}:{}", source, number + 1),
                    format!("Ignoring malformed IRI mapping '{}'", line),
                ),
            }
        }

        Self { entries }
    }

    pub fn insert(&mut self, iri: impl Into<String>, local: impl Into<PathBuf>) {
        self.entries.insert(iri.into(), local.into());
    }

    /// Local substitute for `iri`, if one is configured
    pub fn resolve(&self, iri: &str) -> Option<&Path> {
        self.entries.get(iri).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
