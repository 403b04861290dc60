/**
 * query.rs
 * SPARQL query builders for extracting OWL structure from a loaded document
 */

use std::collections::HashMap;

pub type QueryResult = HashMap<String, String>;

const PREFIXES: &str = r#"
            PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
            PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
            PREFIX owl: <http://www.w3.org/2002/07/owl#>
"#;

pub struct SparqlQuery {
    query: String,
}

impl SparqlQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    fn with_prefixes(body: &str) -> Self {
        Self::new(format!("{}{}", PREFIXES, body))
    }

    /// Targets of every `owl:imports` in the document
    pub fn imports() -> Self {
        Self::with_prefixes(
            r#"
            SELECT DISTINCT ?import
            WHERE {
                ?ontology owl:imports ?import .
                FILTER(isIRI(?import))
            }
            "#,
        )
    }

    /// Named classes in the document's signature
    ///
    /// A class is in the signature when it is declared as `owl:Class` or used
    /// on either side of `rdfs:subClassOf` / `owl:equivalentClass`.
    pub fn signature_classes() -> Self {
        Self::with_prefixes(
            r#"
            SELECT DISTINCT ?class
            WHERE {
                {
                    ?class rdf:type owl:Class .
                } UNION {
                    ?class rdfs:subClassOf ?other .
                } UNION {
                    ?other rdfs:subClassOf ?class .
                } UNION {
                    ?class owl:equivalentClass ?other .
                } UNION {
                    ?other owl:equivalentClass ?class .
                }
                FILTER(isIRI(?class))
            }
            "#,
        )
    }

    /// Told subsumptions between named classes
    pub fn named_subclass_axioms() -> Self {
        Self::with_prefixes(
            r#"
            SELECT ?sub ?super
            WHERE {
                ?sub rdfs:subClassOf ?super .
                FILTER(isIRI(?sub) && isIRI(?super))
            }
            "#,
        )
    }

    /// Told equivalences between named classes
    pub fn named_equivalence_axioms() -> Self {
        Self::with_prefixes(
            r#"
            SELECT ?left ?right
            WHERE {
                ?left owl:equivalentClass ?right .
                FILTER(isIRI(?left) && isIRI(?right))
            }
            "#,
        )
    }
}
