//! In-memory ontology model
//!
//! The pipeline only ever talks to the [`Ontology`] trait. [`OwlOntology`] is
//! the concrete, build-once implementation produced by the loader (and built
//! by hand in tests).

use oxigraph::model::NamedNode;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

use super::vocab::{BuiltInClass, RDFS_LABEL, XSD_BOOLEAN};

/// Value object ensuring that supplied text represents a valid IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`].
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Local name of the IRI, used as the concept code.
    ///
    /// Text after the last `#` or `/`. IRIs ending in a separator use their
    /// last non-empty segment; IRIs without any separator are returned whole.
    ///
    /// ```
    /// use fhir_owl::ontology::Iri;
    ///
    /// let iri = Iri::new("http://purl.obolibrary.org/obo/HP_0000118").unwrap();
    /// assert_eq!(iri.short_form(), "HP_0000118");
    /// let iri = Iri::new("http://x.org/onto#Foo").unwrap();
    /// assert_eq!(iri.short_form(), "Foo");
    /// ```
    #[must_use]
    pub fn short_form(&self) -> &str {
        short_form(&self.value)
    }
}

/// Short form of any IRI-like text (see [`Iri::short_form`]).
pub fn short_form(value: &str) -> &str {
    let is_separator = |c: char| c == '#' || c == '/';
    let trimmed = value.trim_end_matches(is_separator);
    match trimmed.rfind(is_separator) {
        Some(idx) if idx + 1 < trimmed.len() => &trimmed[idx + 1..],
        _ if trimmed.is_empty() => value,
        _ => trimmed,
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl From<NamedNode> for Iri {
    fn from(node: NamedNode) -> Self {
        Self {
            value: node.into_string(),
        }
    }
}

impl From<BuiltInClass> for Iri {
    fn from(class: BuiltInClass) -> Self {
        Self {
            value: class.uri().to_string(),
        }
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}

/// Identity of an ontology: primary IRI plus optional version IRI.
///
/// An ontology without a primary IRI is anonymous.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OntologyId {
    pub iri: Option<Iri>,
    pub version_iri: Option<Iri>,
}

impl OntologyId {
    pub fn named(iri: Iri) -> Self {
        Self {
            iri: Some(iri),
            version_iri: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version_iri: Iri) -> Self {
        self.version_iri = Some(version_iri);
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.iri.is_none()
    }
}

/// A typed RDF literal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    pub lexical: String,
    pub datatype: String,
    pub language: Option<String>,
}

impl Literal {
    /// Plain `xsd:string` literal
    pub fn string(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: "http://www.w3.org/2001/XMLSchema#string".to_string(),
            language: None,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            lexical: value.to_string(),
            datatype: XSD_BOOLEAN.to_string(),
            language: None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.datatype == XSD_BOOLEAN
    }

    /// Boolean value of an `xsd:boolean` literal, `None` for any other
    /// datatype or an invalid lexical form.
    pub fn as_boolean(&self) -> Option<bool> {
        if !self.is_boolean() {
            return None;
        }
        match self.lexical.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.language {
            Some(lang) => write!(f, "\"{}\"@{}", self.lexical, lang),
            None => write!(f, "\"{}\"^^<{}>", self.lexical, self.datatype),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationValue {
    Literal(Literal),
    Iri(Iri),
}

impl AnnotationValue {
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            Self::Iri(_) => None,
        }
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Iri(iri) => Some(iri),
            Self::Literal(_) => None,
        }
    }
}

/// An annotation assertion: property IRI plus value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub property: Iri,
    pub value: AnnotationValue,
}

impl Annotation {
    pub fn literal(property: Iri, literal: Literal) -> Self {
        Self {
            property,
            value: AnnotationValue::Literal(literal),
        }
    }

    pub fn iri(property: Iri, value: Iri) -> Self {
        Self {
            property,
            value: AnnotationValue::Iri(value),
        }
    }
}

/// Read-only view of an ontology document, the contract the pipeline depends on.
pub trait Ontology {
    fn id(&self) -> &OntologyId;

    /// Ontology-level annotations in declaration order
    fn annotations(&self) -> &[Annotation];

    /// IRIs named in `owl:imports`
    fn imports(&self) -> &[Iri];

    /// Classes in this ontology's own signature (imports excluded), sorted by IRI
    fn classes(&self) -> Vec<&Iri>;

    /// Annotations on `class` asserted in this ontology, in declaration order
    fn class_annotations(&self, class: &Iri) -> &[Annotation];

    /// Told `(sub, super)` pairs between named classes
    fn subclass_axioms(&self) -> &[(Iri, Iri)];

    /// Told equivalences between named classes
    fn equivalence_axioms(&self) -> &[(Iri, Iri)];

    fn iri(&self) -> Option<&Iri> {
        self.id().iri.as_ref()
    }

    /// Human readable name: first `rdfs:label`, else the IRI, else `<anonymous>`
    fn display_name(&self) -> String {
        self.annotations()
            .iter()
            .filter(|a| a.property.as_str() == RDFS_LABEL)
            .find_map(|a| a.value.as_literal())
            .map(|l| l.lexical.clone())
            .or_else(|| self.iri().map(|iri| iri.to_string()))
            .unwrap_or_else(|| "<anonymous>".to_string())
    }
}

/// Concrete ontology built by the loader
#[derive(Clone, Debug, Default)]
pub struct OwlOntology {
    id: OntologyId,
    location: Option<String>,
    annotations: Vec<Annotation>,
    imports: Vec<Iri>,
    classes: BTreeMap<Iri, Vec<Annotation>>,
    subclass_of: Vec<(Iri, Iri)>,
    equivalent_to: Vec<(Iri, Iri)>,
}

impl OwlOntology {
    pub fn new(id: OntologyId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Document the ontology was read from, if any
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn set_location(&mut self, location: impl Into<String>) -> &mut Self {
        self.location = Some(location.into());
        self
    }

    pub fn annotate(&mut self, annotation: Annotation) -> &mut Self {
        self.annotations.push(annotation);
        self
    }

    pub fn add_import(&mut self, iri: Iri) -> &mut Self {
        if !self.imports.contains(&iri) {
            self.imports.push(iri);
        }
        self
    }

    /// Adds `class` to the signature
    pub fn declare_class(&mut self, class: Iri) -> &mut Self {
        self.classes.entry(class).or_default();
        self
    }

    /// Adds an annotation on `class`, declaring it if needed
    pub fn annotate_class(&mut self, class: Iri, annotation: Annotation) -> &mut Self {
        self.classes.entry(class).or_default().push(annotation);
        self
    }

    /// Records `sub ⊑ sup`; both classes join the signature
    pub fn add_subclass_of(&mut self, sub: Iri, sup: Iri) -> &mut Self {
        self.declare_class(sub.clone());
        self.declare_class(sup.clone());
        self.subclass_of.push((sub, sup));
        self
    }

    /// Records `a ≡ b`; both classes join the signature
    pub fn add_equivalent_class(&mut self, a: Iri, b: Iri) -> &mut Self {
        self.declare_class(a.clone());
        self.declare_class(b.clone());
        self.equivalent_to.push((a, b));
        self
    }
}

impl Ontology for OwlOntology {
    fn id(&self) -> &OntologyId {
        &self.id
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn imports(&self) -> &[Iri] {
        &self.imports
    }

    fn classes(&self) -> Vec<&Iri> {
        self.classes.keys().collect()
    }

    fn class_annotations(&self, class: &Iri) -> &[Annotation] {
        self.classes.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    fn subclass_axioms(&self) -> &[(Iri, Iri)] {
        &self.subclass_of
    }

    fn equivalence_axioms(&self) -> &[(Iri, Iri)] {
        &self.equivalent_to
    }
}
