/**
 * ontology module
 *
 * - model: ontology contract (`Ontology` trait) and the in-memory `OwlOntology`
 * - library: loads a document and its import closure with Oxigraph
 * - query: SPARQL query builders used by the loader
 * - iri_mappings: offline redirection of import IRIs to local files
 * - vocab: RDF/RDFS/OWL/Dublin Core IRIs
 */

pub mod iri_mappings;
pub mod library;
pub mod model;
pub mod query;
pub mod vocab;

pub use iri_mappings::IriMappings;
pub use library::{read_ontology, OntologyError, OntologyLibrary};
pub use model::{
    short_form, Annotation, AnnotationValue, Iri, IriError, Literal, Ontology, OntologyId,
    OwlOntology,
};
pub use query::{QueryResult, SparqlQuery};
pub use vocab::BuiltInClass;
