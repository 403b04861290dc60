//! Literal annotation index for an ontology header or a class

use std::collections::HashMap;

use crate::ontology::{Annotation, Iri, Ontology};

/// Property IRI → literal values in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationIndex {
    values: HashMap<String, Vec<String>>,
}

impl AnnotationIndex {
    /// Index the literal-valued entries of `annotations`. IRI-valued
    /// annotations are left out, see [`iri_values`].
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for annotation in annotations {
            if let Some(literal) = annotation.value.as_literal() {
                values
                    .entry(annotation.property.as_str().to_string())
                    .or_default()
                    .push(literal.lexical.clone());
            }
        }
        Self { values }
    }

    pub fn for_ontology<O: Ontology + ?Sized>(ontology: &O) -> Self {
        Self::from_annotations(ontology.annotations())
    }

    pub fn for_class<O: Ontology + ?Sized>(ontology: &O, class: &Iri) -> Self {
        Self::from_annotations(ontology.class_annotations(class))
    }

    pub fn values(&self, property: &str) -> &[String] {
        self.values.get(property).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, property: &str) -> Option<&str> {
        self.values(property).first().map(String::as_str)
    }

    /// First value of the first property in `properties` that has any
    pub fn first_of<S: AsRef<str>>(&self, properties: &[S]) -> Option<&str> {
        properties.iter().find_map(|p| self.first(p.as_ref()))
    }

    pub fn contains(&self, property: &str) -> bool {
        self.values.contains_key(property)
    }
}

/// IRI-valued annotations of `property`, in declaration order
pub fn iri_values<'a>(annotations: &'a [Annotation], property: &str) -> Vec<&'a Iri> {
    annotations
        .iter()
        .filter(|a| a.property.as_str() == property)
        .filter_map(|a| a.value.as_iri())
        .collect()
}
