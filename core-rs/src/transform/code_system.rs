//! Code system assembly: one ontology of the closure to one code system

use serde::Serialize;

use crate::config::{CodeSystemOverrides, PublicationStatus};
use crate::errors::{FhirOwlError, Result};
use crate::ontology::vocab::{DC_SOURCE, RDFS_LABEL};
use crate::ontology::Ontology;
use crate::reasoner::Reasoner;
use crate::report::Diagnostics;
use crate::transform::annotations::{iri_values, AnnotationIndex};
use crate::transform::concept::{ConceptAssembler, ConceptRecord};
use crate::transform::TransformContext;

/// Version reported for ontologies without a version IRI
pub const UNKNOWN_VERSION: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    Complete,
    /// The ontology is derived from another one (`dc:source`)
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Code,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub code: &'static str,
    pub kind: PropertyType,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDefinition {
    pub code: &'static str,
    pub operator: &'static str,
    pub value: &'static str,
}

pub const PARENT_PROPERTY: &str = "parent";
pub const ROOT_PROPERTY: &str = "root";
pub const DEPRECATED_PROPERTY: &str = "deprecated";

/// Concept properties declared by every code system
pub const PROPERTIES: [PropertyDefinition; 3] = [
    PropertyDefinition {
        code: PARENT_PROPERTY,
        kind: PropertyType::Code,
        description: "Parent codes.",
    },
    PropertyDefinition {
        code: ROOT_PROPERTY,
        kind: PropertyType::Boolean,
        description: "Indicates if this concept is a root concept (i.e. Thing is equivalent or a direct parent)",
    },
    PropertyDefinition {
        code: DEPRECATED_PROPERTY,
        kind: PropertyType::Boolean,
        description: "Indicates if this concept is deprecated.",
    },
];

pub const FILTERS: [FilterDefinition; 2] = [
    FilterDefinition {
        code: ROOT_PROPERTY,
        operator: "=",
        value: "True or false.",
    },
    FilterDefinition {
        code: DEPRECATED_PROPERTY,
        operator: "=",
        value: "True or false.",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSystemRecord {
    /// Resource id set by configuration; derived from the name otherwise
    pub id: Option<String>,
    pub url: String,
    pub version: String,
    pub name: String,
    pub title: Option<String>,
    pub status: PublicationStatus,
    pub experimental: Option<bool>,
    pub date: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub purpose: Option<String>,
    pub copyright: Option<String>,
    /// Value set holding every code of this system
    pub value_set: String,
    pub language: Option<String>,
    pub compositional: Option<bool>,
    pub version_needed: Option<bool>,
    pub content: ContentMode,
    /// Sorted by class IRI
    pub concepts: Vec<ConceptRecord>,
}

impl CodeSystemRecord {
    /// Active, complete code system whose implicit value set is its URL
    pub fn new(url: impl Into<String>, version: impl Into<String>, name: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: None,
            value_set: url.clone(),
            url,
            version: version.into(),
            name: name.into(),
            title: None,
            status: PublicationStatus::Active,
            experimental: None,
            date: None,
            publisher: None,
            description: None,
            purpose: None,
            copyright: None,
            language: None,
            compositional: None,
            version_needed: None,
            content: ContentMode::Complete,
            concepts: Vec::new(),
        }
    }

    /// Apply configured metadata. Set values win over those read from
    /// the ontology.
    pub fn apply(&mut self, overrides: &CodeSystemOverrides) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn merge<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }

        merge(&mut self.id, &overrides.id);
        set(&mut self.url, &overrides.url);
        set(&mut self.version, &overrides.version);
        set(&mut self.name, &overrides.name);
        merge(&mut self.title, &overrides.title);
        set(&mut self.status, &overrides.status);
        merge(&mut self.experimental, &overrides.experimental);
        merge(&mut self.date, &overrides.date);
        merge(&mut self.publisher, &overrides.publisher);
        merge(&mut self.description, &overrides.description);
        merge(&mut self.purpose, &overrides.purpose);
        merge(&mut self.copyright, &overrides.copyright);
        self.value_set = overrides.value_set.clone().unwrap_or_else(|| self.url.clone());
        merge(&mut self.language, &overrides.language);
        merge(&mut self.compositional, &overrides.compositional);
        merge(&mut self.version_needed, &overrides.version_needed);
    }

    pub fn hierarchy_meaning(&self) -> &'static str {
        "is-a"
    }

    pub fn properties(&self) -> &'static [PropertyDefinition] {
        &PROPERTIES
    }

    pub fn filters(&self) -> &'static [FilterDefinition] {
        &FILTERS
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

pub struct CodeSystemAssembler<'a> {
    context: &'a TransformContext<'a>,
    reasoner: &'a dyn Reasoner,
}

impl<'a> CodeSystemAssembler<'a> {
    pub fn new(context: &'a TransformContext<'a>, reasoner: &'a dyn Reasoner) -> Self {
        Self { context, reasoner }
    }

    /// Build the code system for `ontology`.
    ///
    /// Fails with [`FhirOwlError::MissingOntologyIri`] for an anonymous
    /// ontology. Only classes whose resolved system is this code system's
    /// URL become concepts. The input ontology also takes the configured
    /// metadata overrides.
    pub fn assemble<O: Ontology + ?Sized>(
        &self,
        ontology: &O,
        diagnostics: &mut Diagnostics,
    ) -> Result<CodeSystemRecord> {
        let iri = ontology
            .iri()
            .ok_or_else(|| FhirOwlError::MissingOntologyIri(ontology.display_name()))?;
        let version = ontology
            .id()
            .version_iri
            .as_ref()
            .map(|v| v.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string());

        let index = AnnotationIndex::for_ontology(ontology);
        let config = self.context.config;
        let name = config
            .name_property
            .as_deref()
            .and_then(|property| index.first(property))
            .or_else(|| index.first(RDFS_LABEL))
            .unwrap_or(iri.as_str())
            .to_string();

        let mut record = CodeSystemRecord::new(iri.as_str(), version, name);
        record.publisher = index
            .first_of(config.publisher_properties.as_slice())
            .map(str::to_string);
        record.description = index
            .first_of(config.description_properties.as_slice())
            .map(str::to_string);
        if !iri_values(ontology.annotations(), DC_SOURCE).is_empty() {
            record.content = ContentMode::Fragment;
        }
        if let Some(overrides) = self.context.overrides_for(iri) {
            record.apply(overrides);
        }

        let concepts = ConceptAssembler::new(self.reasoner, &self.context.systems)
            .with_options(&config.concepts, &self.context.codes);
        for class in ontology.classes() {
            match self.context.systems.get(class) {
                Some(system) if system == record.url => {
                    let concept = concepts.assemble(ontology, class, diagnostics);
                    if concepts.includes(&concept) {
                        record.concepts.push(concept);
                    } else {
                        tracing::debug!("Excluding deprecated class {}", class);
                    }
                }
                system => {
                    tracing::debug!("Skipping class {} with system {:?} in {}", class, system, record.url);
                }
            }
        }

        Ok(record)
    }
}
