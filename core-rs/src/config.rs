/**
 * config.rs
 * Transformation settings (YAML format)
 *
 * Format:
 * ```yaml
 * publisherProperties:
 *   - http://purl.org/dc/elements/1.1/publisher
 * descriptionProperties:
 *   - http://purl.org/dc/elements/1.1/description
 *   - http://www.w3.org/2000/01/rdf-schema#comment
 * nameProperty: http://www.w3.org/2000/01/rdf-schema#label
 * iriMappings: iri_mappings.txt
 * missingImports: fail
 * fetchRemoteImports: true
 * codeSystem:            # applies to the input ontology's code system only
 *   id: hpo
 *   url: http://example.org/fhir/CodeSystem/hpo
 *   version: 2024-04-26
 *   title: Human Phenotype Ontology
 *   status: draft
 *   date: 2024-04-26
 *   experimental: true
 * concepts:
 *   codeProperty: http://www.geneontology.org/formats/oboInOwl#id
 *   codeReplace: { target: "_", replacement: ":" }
 *   displayProperty: http://www.w3.org/2000/01/rdf-schema#label
 *   definitionProperty: http://purl.obolibrary.org/obo/IAO_0000115
 *   synonymProperties:
 *     - http://www.geneontology.org/formats/oboInOwl#hasExactSynonym
 *   labelsToExclude: [obsolete]
 *   includeDeprecated: true
 * ```
 *
 * Every key is optional; missing keys take the defaults below.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;

use crate::errors::FhirOwlError;
use crate::ontology::iri_mappings::DEFAULT_IRI_MAPPINGS;
use crate::ontology::vocab::{
    DCTERMS_DESCRIPTION, DCTERMS_PUBLISHER, DC_DESCRIPTION, DC_PUBLISHER, RDFS_COMMENT,
};
use crate::ontology::Iri;

/// What to do with an `owl:imports` target that cannot be loaded
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingImports {
    /// Abort the run
    #[default]
    Fail,
    /// Record a warning and continue without the import
    Skip,
}

/// Publication status of a code system
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Draft,
    #[default]
    Active,
    Retired,
    Unknown,
}

impl FromStr for PublicationStatus {
    type Err = FhirOwlError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "retired" => Ok(Self::Retired),
            "unknown" => Ok(Self::Unknown),
            _ => Err(FhirOwlError::ValidationError(format!(
                "Invalid status '{}'. Valid values are draft, active, retired and unknown.",
                value
            ))),
        }
    }
}

/// Metadata set on the code system of the input ontology, taking
/// precedence over anything read from its annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeSystemOverrides {
    /// Resource id used in the `PUT CodeSystem/{id}` request
    pub id: Option<String>,
    /// Canonical URL, replacing the ontology IRI in every coding
    pub url: Option<String>,
    pub version: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub status: Option<PublicationStatus>,
    pub experimental: Option<bool>,
    /// `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or `YYYY-MM-DDThh:mm:ss+zz:zz`
    pub date: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub purpose: Option<String>,
    pub copyright: Option<String>,
    pub value_set: Option<String>,
    pub language: Option<String>,
    pub compositional: Option<bool>,
    pub version_needed: Option<bool>,
}

/// Substitution applied to every concept code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeReplace {
    pub target: String,
    pub replacement: String,
}

impl CodeReplace {
    /// Parse `target,replacement`
    pub fn parse(value: &str) -> Result<Self, FhirOwlError> {
        match value.split(',').collect::<Vec<_>>().as_slice() {
            [target, replacement] => Ok(Self {
                target: target.to_string(),
                replacement: replacement.to_string(),
            }),
            _ => Err(FhirOwlError::ValidationError(format!(
                "Invalid codeReplace value '{}'. This should have two strings separated by a comma.",
                value
            ))),
        }
    }

    pub fn apply(&self, code: &str) -> String {
        code.replace(&self.target, &self.replacement)
    }
}

impl FromStr for CodeReplace {
    type Err = FhirOwlError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// How classes become concepts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConceptOptions {
    /// Annotation property holding the code; the class short form when unset
    /// or when a class has no value for it
    pub code_property: Option<String>,
    pub code_replace: Option<CodeReplace>,
    /// Annotation property holding the display; `rdfs:label` when unset
    pub display_property: Option<String>,
    pub definition_property: Option<String>,
    /// Annotation properties holding synonyms. When unset, any property
    /// whose short form is `hasExactSynonym`.
    pub synonym_properties: Option<Vec<String>>,
    /// Label values never used as a display or a synonym
    pub labels_to_exclude: Vec<String>,
    pub include_deprecated: bool,
}

impl Default for ConceptOptions {
    fn default() -> Self {
        ConceptOptions {
            code_property: None,
            code_replace: None,
            display_property: None,
            definition_property: None,
            synonym_properties: None,
            labels_to_exclude: Vec::new(),
            include_deprecated: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformConfig {
    /// Ordered annotation properties holding the publisher; first match wins
    pub publisher_properties: Vec<String>,
    /// Ordered annotation properties holding the description; first match wins
    pub description_properties: Vec<String>,
    /// Annotation property holding the code system name; `rdfs:label`, then
    /// the ontology IRI, when unset or absent
    pub name_property: Option<String>,
    /// IRI redirection file, `null` disables redirection
    pub iri_mappings: Option<PathBuf>,
    pub missing_imports: MissingImports,
    /// Fetch `http(s)` imports that have no local redirection
    pub fetch_remote_imports: bool,
    pub code_system: CodeSystemOverrides,
    pub concepts: ConceptOptions,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            publisher_properties: vec![DC_PUBLISHER.to_string(), DCTERMS_PUBLISHER.to_string()],
            description_properties: vec![
                DC_DESCRIPTION.to_string(),
                DCTERMS_DESCRIPTION.to_string(),
                RDFS_COMMENT.to_string(),
            ],
            name_property: None,
            iri_mappings: Some(PathBuf::from(DEFAULT_IRI_MAPPINGS)),
            missing_imports: MissingImports::Fail,
            fetch_remote_imports: true,
            code_system: CodeSystemOverrides::default(),
            concepts: ConceptOptions::default(),
        }
    }
}

impl TransformConfig {
    /// Load settings from a YAML file
    ///
    /// # Example
    /// ```no_run
    /// # use fhir_owl::TransformConfig;
    /// let config = TransformConfig::load("fhir-owl.yaml")?;
    /// # Ok::<(), fhir_owl::FhirOwlError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FhirOwlError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FhirOwlError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, FhirOwlError> {
        let config: TransformConfig = serde_yaml::from_str(content).map_err(|e| {
            FhirOwlError::ParseError(format!("Invalid configuration YAML: {}", e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Ensures every configured property and override URL is an absolute
    /// IRI and that the remaining overrides are well formed
    pub fn validate(&self) -> Result<(), FhirOwlError> {
        for (key, properties) in [
            ("publisherProperties", &self.publisher_properties),
            ("descriptionProperties", &self.description_properties),
        ] {
            for property in properties {
                check_iri(key, property)?;
            }
        }

        let concepts = &self.concepts;
        for (key, value) in [
            ("nameProperty", &self.name_property),
            ("concepts.codeProperty", &concepts.code_property),
            ("concepts.displayProperty", &concepts.display_property),
            ("concepts.definitionProperty", &concepts.definition_property),
            ("codeSystem.url", &self.code_system.url),
            ("codeSystem.valueSet", &self.code_system.value_set),
        ] {
            if let Some(value) = value {
                check_iri(key, value)?;
            }
        }
        for property in concepts.synonym_properties.iter().flatten() {
            check_iri("concepts.synonymProperties", property)?;
        }

        if let Some(replace) = &concepts.code_replace {
            if replace.target.is_empty() {
                return Err(FhirOwlError::ValidationError(
                    "concepts.codeReplace target must not be empty".to_string(),
                ));
            }
        }

        let overrides = &self.code_system;
        if let Some(id) = &overrides.id {
            let pattern = Regex::new(r"^[A-Za-z0-9\-.]{1,64}$")?;
            if !pattern.is_match(id) {
                return Err(FhirOwlError::ValidationError(format!(
                    "codeSystem.id is not a valid resource id: '{}'",
                    id
                )));
            }
        }
        if let Some(date) = &overrides.date {
            let pattern = Regex::new(
                r"^\d{4}(-\d{2}(-\d{2}(T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2}))?)?)?$",
            )?;
            if !pattern.is_match(date) {
                return Err(FhirOwlError::ValidationError(format!(
                    "codeSystem.date must be YYYY, YYYY-MM, YYYY-MM-DD or YYYY-MM-DDThh:mm:ss+zz:zz: '{}'",
                    date
                )));
            }
        }

        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FhirOwlError> {
        let yaml = serde_yaml::to_string(self).map_err(|e| {
            FhirOwlError::SerializationError(format!("Failed to serialize configuration: {}", e))
        })?;

        fs::write(path.as_ref(), yaml)?;

        Ok(())
    }

    pub fn with_publisher_properties(mut self, properties: Vec<String>) -> Self {
        self.publisher_properties = properties;
        self
    }

    pub fn with_description_properties(mut self, properties: Vec<String>) -> Self {
        self.description_properties = properties;
        self
    }

    pub fn with_iri_mappings(mut self, path: Option<PathBuf>) -> Self {
        self.iri_mappings = path;
        self
    }

    pub fn with_missing_imports(mut self, strategy: MissingImports) -> Self {
        self.missing_imports = strategy;
        self
    }

    pub fn with_remote_imports(mut self, fetch: bool) -> Self {
        self.fetch_remote_imports = fetch;
        self
    }

    pub fn with_name_property(mut self, property: Option<String>) -> Self {
        self.name_property = property;
        self
    }

    pub fn with_code_system(mut self, overrides: CodeSystemOverrides) -> Self {
        self.code_system = overrides;
        self
    }

    pub fn with_concepts(mut self, options: ConceptOptions) -> Self {
        self.concepts = options;
        self
    }
}

fn check_iri(key: &str, value: &str) -> Result<(), FhirOwlError> {
    Iri::new(value).map(|_| ()).map_err(|_| {
        FhirOwlError::ValidationError(format!("{} contains an invalid IRI: '{}'", key, value))
    })
}
