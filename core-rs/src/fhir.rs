/**
 * fhir.rs
 * FHIR R4 CodeSystem / Bundle output model
 *
 * Only the elements this crate populates are modelled. Field order follows
 * the FHIR JSON element order so the serialized bundle reads like one
 * produced by a FHIR server.
 */

use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::config::PublicationStatus;
use crate::errors::{FhirOwlError, Result};
use crate::transform::bundle::{CodeSystemBundle, PackagedCodeSystem};
use crate::transform::code_system::{
    ContentMode, PropertyType, DEPRECATED_PROPERTY, PARENT_PROPERTY, ROOT_PROPERTY,
};
use crate::transform::concept::ConceptRecord;

pub const SNOMED_CT: &str = "http://snomed.info/sct";
pub const SYNONYM_CODE: &str = "900000000000013009";
pub const SYNONYM_DISPLAY: &str = "Synonym (core metadata concept)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// SNOMED CT "Synonym" designation use
    pub fn synonym_use() -> Self {
        Self::new(SNOMED_CT, SYNONYM_CODE).with_display(SYNONYM_DISPLAY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub code: String,
    pub operator: Vec<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDeclaration {
    pub code: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Designation {
    #[serde(rename = "use")]
    pub usage: Coding,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptProperty {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_coding: Option<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
}

impl ConceptProperty {
    pub fn coding(code: &str, value: Coding) -> Self {
        Self {
            code: code.to_string(),
            value_coding: Some(value),
            value_boolean: None,
        }
    }

    pub fn boolean(code: &str, value: bool) -> Self {
        Self {
            code: code.to_string(),
            value_coding: None,
            value_boolean: Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Concept {
    pub code: String,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub designation: Vec<Designation>,
    pub property: Vec<ConceptProperty>,
}

impl From<&ConceptRecord> for Concept {
    fn from(record: &ConceptRecord) -> Self {
        let designation = record
            .synonyms
            .iter()
            .map(|synonym| Designation {
                usage: Coding::synonym_use(),
                value: synonym.clone(),
            })
            .collect();

        let mut property: Vec<ConceptProperty> = record
            .parents
            .iter()
            .map(|parent| {
                ConceptProperty::coding(PARENT_PROPERTY, Coding::new(&parent.system, &parent.code))
            })
            .collect();
        property.push(ConceptProperty::boolean(ROOT_PROPERTY, record.root));
        property.push(ConceptProperty::boolean(DEPRECATED_PROPERTY, record.deprecated));

        Self {
            code: record.code.clone(),
            display: record.display.clone(),
            definition: record.definition.clone(),
            designation,
            property,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystem {
    pub resource_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub url: String,
    pub version: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: PublicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    pub value_set: String,
    pub hierarchy_meaning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compositional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_needed: Option<bool>,
    pub content: ContentMode,
    pub filter: Vec<Filter>,
    pub property: Vec<PropertyDeclaration>,
    pub concept: Vec<Concept>,
}

impl From<&PackagedCodeSystem> for CodeSystem {
    fn from(packaged: &PackagedCodeSystem) -> Self {
        let record = &packaged.record;
        Self {
            resource_type: "CodeSystem",
            id: Some(packaged.id.clone()),
            language: record.language.clone(),
            url: record.url.clone(),
            version: record.version.clone(),
            name: record.name.clone(),
            title: record.title.clone(),
            status: record.status,
            experimental: record.experimental,
            date: record.date.clone(),
            publisher: record.publisher.clone(),
            description: record.description.clone(),
            purpose: record.purpose.clone(),
            copyright: record.copyright.clone(),
            value_set: record.value_set.clone(),
            hierarchy_meaning: record.hierarchy_meaning().to_string(),
            compositional: record.compositional,
            version_needed: record.version_needed,
            content: record.content,
            filter: record
                .filters()
                .iter()
                .map(|f| Filter {
                    code: f.code.to_string(),
                    operator: vec![f.operator.to_string()],
                    value: f.value.to_string(),
                })
                .collect(),
            property: record
                .properties()
                .iter()
                .map(|p| PropertyDeclaration {
                    code: p.code.to_string(),
                    description: p.description.to_string(),
                    kind: p.kind,
                })
                .collect(),
            concept: record.concepts.iter().map(Concept::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleRequest {
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleEntry {
    pub resource: CodeSystem,
    pub request: BundleRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: &'static str,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

impl From<&CodeSystemBundle> for Bundle {
    fn from(bundle: &CodeSystemBundle) -> Self {
        Self {
            resource_type: "Bundle",
            kind: "batch".to_string(),
            entry: bundle
                .entries
                .iter()
                .map(|packaged| BundleEntry {
                    resource: CodeSystem::from(packaged),
                    request: BundleRequest {
                        method: "PUT".to_string(),
                        url: packaged.request_url(),
                    },
                })
                .collect(),
        }
    }
}

impl Bundle {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FhirOwlError::SerializationError(format!("Failed to serialize bundle: {}", e)))
    }
}

/// Write `bundle` as pretty-printed JSON.
///
/// The document goes to a temporary file next to `path` first and is renamed
/// into place once complete, so a failed write leaves no partial output.
pub fn write_bundle<P: AsRef<Path>>(bundle: &Bundle, path: P) -> Result<()> {
    let path = path.as_ref();
    tracing::info!("Writing bundle to file: {}", path.display());

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(|e| output_error(path, e))?;
    }

    let temp = NamedTempFile::new_in(dir).map_err(|e| output_error(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, bundle).map_err(|e| {
            FhirOwlError::SerializationError(format!("Failed to serialize bundle: {}", e))
        })?;
        writer.write_all(b"\n").map_err(|e| output_error(path, e))?;
        writer.flush().map_err(|e| output_error(path, e))?;
    }
    temp.persist(path).map_err(|e| output_error(path, e.error))?;

    Ok(())
}

fn output_error(path: &Path, err: std::io::Error) -> FhirOwlError {
    FhirOwlError::OutputError(format!("{}: {}", path.display(), err))
}
