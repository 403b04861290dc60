//! Bundle packaging

use crate::ontology::short_form;
use crate::report::Diagnostics;
use crate::transform::code_system::CodeSystemRecord;

/// A code system paired with its resource id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedCodeSystem {
    pub id: String,
    pub record: CodeSystemRecord,
}

impl PackagedCodeSystem {
    /// Upsert target, `CodeSystem/{id}`
    pub fn request_url(&self) -> String {
        format!("CodeSystem/{}", self.id)
    }
}

/// Batch of code systems, one upsert per non-empty record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSystemBundle {
    pub entries: Vec<PackagedCodeSystem>,
}

impl CodeSystemBundle {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resource id derived from a code system name.
///
/// IRI-like names (containing `/`) are reduced to their short form, then
/// anything outside `[A-Za-z0-9]` becomes `-`.
pub fn resource_id(name: &str) -> String {
    let base = if name.contains('/') {
        short_form(name)
    } else {
        name
    };

    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[derive(Debug, Default)]
pub struct BundleAssembler;

impl BundleAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(
        &self,
        records: Vec<CodeSystemRecord>,
        diagnostics: &mut Diagnostics,
    ) -> CodeSystemBundle {
        let mut entries = Vec::new();

        for record in records {
            if record.is_empty() {
                diagnostics.info(
                    record.url.as_str(),
                    format!("Excluding code system {} because it has no codes", record.name),
                );
                continue;
            }

            tracing::info!(
                "Adding code system {} [{}]",
                record.name,
                record.concepts.len()
            );
            let id = record
                .id
                .clone()
                .unwrap_or_else(|| resource_id(&record.name));
            entries.push(PackagedCodeSystem { id, record });
        }

        CodeSystemBundle { entries }
    }
}
