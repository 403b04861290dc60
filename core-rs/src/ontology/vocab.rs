//! Well-known vocabulary used when reading OWL documents
//!
//! Holds the RDF/RDFS/OWL/Dublin Core IRIs the loader and the transformation
//! pipeline look for, plus the two built-in OWL classes that get special
//! treatment during classification.

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_SUBPROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";

pub const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_IMPORTS: &str = "http://www.w3.org/2002/07/owl#imports";
pub const OWL_VERSION_IRI: &str = "http://www.w3.org/2002/07/owl#versionIRI";
pub const OWL_EQUIVALENT_CLASS: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
pub const OWL_DISJOINT_WITH: &str = "http://www.w3.org/2002/07/owl#disjointWith";
pub const OWL_INTERSECTION_OF: &str = "http://www.w3.org/2002/07/owl#intersectionOf";
pub const OWL_UNION_OF: &str = "http://www.w3.org/2002/07/owl#unionOf";
pub const OWL_COMPLEMENT_OF: &str = "http://www.w3.org/2002/07/owl#complementOf";
pub const OWL_ONE_OF: &str = "http://www.w3.org/2002/07/owl#oneOf";
pub const OWL_DISJOINT_UNION_OF: &str = "http://www.w3.org/2002/07/owl#disjointUnionOf";
pub const OWL_HAS_KEY: &str = "http://www.w3.org/2002/07/owl#hasKey";
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_NOTHING: &str = "http://www.w3.org/2002/07/owl#Nothing";

pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

pub const DC_SOURCE: &str = "http://purl.org/dc/elements/1.1/source";
pub const DC_PUBLISHER: &str = "http://purl.org/dc/elements/1.1/publisher";
pub const DC_DESCRIPTION: &str = "http://purl.org/dc/elements/1.1/description";
pub const DCTERMS_PUBLISHER: &str = "http://purl.org/dc/terms/publisher";
pub const DCTERMS_DESCRIPTION: &str = "http://purl.org/dc/terms/description";

/// Short form of the annotation property flagging a class as deprecated
/// (`owl:deprecated` and look-alikes in other namespaces).
pub const DEPRECATED_SHORT_FORM: &str = "deprecated";

/// Short form of the oboInOwl exact synonym annotation property.
pub const EXACT_SYNONYM_SHORT_FORM: &str = "hasExactSynonym";

/// Predicates that carry OWL structure rather than annotations.
const STRUCTURAL_PREDICATES: &[&str] = &[
    RDF_TYPE,
    RDFS_SUBCLASS_OF,
    RDFS_SUBPROPERTY_OF,
    RDFS_DOMAIN,
    RDFS_RANGE,
    OWL_IMPORTS,
    OWL_VERSION_IRI,
    OWL_EQUIVALENT_CLASS,
    OWL_DISJOINT_WITH,
    OWL_INTERSECTION_OF,
    OWL_UNION_OF,
    OWL_COMPLEMENT_OF,
    OWL_ONE_OF,
    OWL_DISJOINT_UNION_OF,
    OWL_HAS_KEY,
];

/// Returns true when `predicate` is part of the OWL structural vocabulary and
/// must not be read as an annotation.
pub fn is_structural_predicate(predicate: &str) -> bool {
    STRUCTURAL_PREDICATES.contains(&predicate)
}

/// Built-in OWL classes
///
/// # Examples
///
/// ```
/// use fhir_owl::ontology::BuiltInClass;
///
/// assert_eq!(BuiltInClass::Thing.uri(), "http://www.w3.org/2002/07/owl#Thing");
/// assert_eq!(
///     BuiltInClass::from_uri("http://www.w3.org/2002/07/owl#Nothing"),
///     Some(BuiltInClass::Nothing)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInClass {
    /// owl:Thing - the universal top class
    Thing,

    /// owl:Nothing - the universal bottom class
    Nothing,
}

impl BuiltInClass {
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Thing => OWL_THING,
            Self::Nothing => OWL_NOTHING,
        }
    }

    /// Display label used for the built-in class in terminology output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Thing => "Thing",
            Self::Nothing => "Nothing",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            OWL_THING => Some(Self::Thing),
            OWL_NOTHING => Some(Self::Nothing),
            _ => None,
        }
    }
}
