//! System resolution
//!
//! Every class in the import closure is assigned the URL of the code system
//! it belongs to. A class belongs to an ontology when its IRI starts with the
//! ontology IRI, or when its short form follows the OBO `PREFIX_digits`
//! convention and `PREFIX` names an ontology of the closure (`hp` for
//! `.../hp.owl`).

use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashMap;

use crate::errors::Result;
use crate::ontology::{short_form, Iri, Ontology};
use crate::report::Diagnostics;

const OBO_FILE_SUFFIX: &str = ".owl";

static OBO_CODE: OnceCell<Regex> = OnceCell::new();

fn obo_code() -> Result<&'static Regex> {
    Ok(OBO_CODE.get_or_try_init(|| Regex::new(r"^[A-Za-z]*_[0-9]*$"))?)
}

/// Lower-cased OBO prefix → ontology IRI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTable {
    prefixes: HashMap<String, String>,
}

impl PrefixTable {
    pub fn build<O: Ontology>(closure: &[O], diagnostics: &mut Diagnostics) -> Self {
        tracing::info!("Building prefix -> system map");
        let mut prefixes = HashMap::new();

        for ontology in closure {
            let Some(iri) = ontology.iri() else {
                diagnostics.warn(ontology.display_name(), "Ontology has no IRI");
                continue;
            };

            match iri.short_form().strip_suffix(OBO_FILE_SUFFIX) {
                Some(prefix) if !prefix.is_empty() => {
                    tracing::info!("Found OBO-like IRI: {}", iri);
                    prefixes
                        .entry(prefix.to_lowercase())
                        .or_insert_with(|| iri.as_str().to_string());
                }
                _ => tracing::info!("IRI is not OBO-like: {}", iri),
            }
        }

        Self { prefixes }
    }

    pub fn insert(&mut self, prefix: &str, system: impl Into<String>) {
        self.prefixes.insert(prefix.to_lowercase(), system.into());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(&prefix.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Resolve the system of `class` declared in the ontology `owner`.
///
/// Returns `None` when neither IRI containment nor the OBO prefix table
/// applies.
pub fn resolve_system(
    class: &Iri,
    owner: Option<&str>,
    prefixes: &PrefixTable,
) -> Result<Option<String>> {
    if let Some(owner) = owner {
        if class.as_str().starts_with(owner) {
            return Ok(Some(owner.to_string()));
        }
    }

    let code = short_form(class.as_str());
    if obo_code()?.is_match(code) {
        let prefix = code.split('_').next().unwrap_or_default();
        return Ok(prefixes.get(prefix).map(str::to_string));
    }

    Ok(None)
}

/// Class IRI → system, for every class of the closure
#[derive(Debug, Clone, Default)]
pub struct SystemMap {
    systems: HashMap<Iri, String>,
}

impl SystemMap {
    /// Resolve every class in each ontology's own signature. Unresolved
    /// classes fall back to the declaring ontology IRI. A class declared by
    /// several ontologies keeps a resolved entry over a fallback one, then
    /// the first in closure order.
    pub fn build<O: Ontology>(closure: &[O], prefixes: &PrefixTable) -> Result<Self> {
        tracing::info!("Building IRI -> system map");
        let mut entries: HashMap<Iri, (String, bool)> = HashMap::new();

        for ontology in closure {
            let owner = ontology.iri().map(Iri::as_str);
            for class in ontology.classes() {
                let (system, resolved) = match resolve_system(class, owner, prefixes)? {
                    Some(system) => (system, true),
                    None => match owner {
                        Some(owner) => (owner.to_string(), false),
                        None => continue,
                    },
                };

                let replace = match entries.get(class) {
                    Some((_, true)) => false,
                    Some((_, false)) => resolved,
                    None => true,
                };
                if replace {
                    entries.insert(class.clone(), (system, resolved));
                }
            }
        }

        let systems = entries
            .into_iter()
            .map(|(class, (system, _))| (class, system))
            .collect();

        Ok(Self { systems })
    }

    pub fn get(&self, class: &Iri) -> Option<&str> {
        self.systems.get(class).map(String::as_str)
    }

    /// Publish every class of system `from` under `to` instead
    pub fn rename_system(&mut self, from: &str, to: &str) {
        for system in self.systems.values_mut().filter(|s| s.as_str() == from) {
            *system = to.to_string();
        }
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
