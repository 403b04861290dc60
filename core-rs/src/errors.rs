//! Error types for FHIR OWL

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FhirOwlError {
    #[error("Ontology has no IRI: {0}")]
    MissingOntologyIri(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ontology error: {0}")]
    Ontology(String),

    #[error("Import could not be loaded: {0}")]
    ImportLoad(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Regex error: {0}")]
    RegexError(String),
}

impl From<regex::Error> for FhirOwlError {
    fn from(err: regex::Error) -> Self {
        FhirOwlError::RegexError(err.to_string())
    }
}

impl From<crate::ontology::library::OntologyError> for FhirOwlError {
    fn from(err: crate::ontology::library::OntologyError) -> Self {
        use crate::ontology::library::OntologyError;
        match err {
            OntologyError::ImportError(msg) => FhirOwlError::ImportLoad(msg),
            OntologyError::NotFound(msg) => FhirOwlError::FileNotFound(msg),
            other => FhirOwlError::Ontology(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FhirOwlError>;
