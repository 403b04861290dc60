//! # FHIR OWL
//!
//! Transforms an OWL ontology and its import closure into a FHIR R4 batch
//! `Bundle` holding one `CodeSystem` per ontology.
//!
//! ## Pipeline
//!
//! ```text
//!   document ──► OntologyLibrary ──► import closure
//!                                        │
//!                 PrefixTable + SystemMap ◄┤
//!                  StructuralReasoner    ◄┘ (classified once)
//!                                        │
//!       per ontology: CodeSystemAssembler ─► ConceptAssembler per class
//!                                        │
//!                    BundleAssembler ─► pretty JSON bundle
//! ```
//!
//! Each class becomes a concept in exactly one code system: the one whose
//! URL is the class's resolved system (IRI containment, or OBO `PREFIX_n`
//! codes matched against `.../prefix.owl` ontologies). Classes that resolve
//! to no ontology of the closure are left out.

pub mod config;
pub mod errors;
pub mod fhir;
pub mod ontology;
pub mod reasoner;
pub mod report;
pub mod transform;

pub use config::{
    CodeReplace, CodeSystemOverrides, ConceptOptions, MissingImports, PublicationStatus,
    TransformConfig,
};
pub use errors::{FhirOwlError, Result};
pub use fhir::{write_bundle, Bundle};
pub use ontology::{Iri, IriMappings, Ontology, OntologyId, OntologyLibrary, OwlOntology};
pub use reasoner::{Reasoner, StructuralReasoner};
pub use report::{CodeSystemSummary, Diagnostic, Diagnostics, Severity, TransformReport};
pub use transform::{
    build_bundle, resource_id, transform, CodeSystemBundle, CodeSystemRecord, CodeTable,
    ConceptRecord, ParentRef, TransformContext,
};

/// FHIR release the output conforms to
pub const FHIR_VERSION: &str = "4.0.1";
