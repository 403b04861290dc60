/**
 * library.rs
 * Loads an OWL document and its import closure with Oxigraph
 */

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{NamedNode, Quad, Subject, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use thiserror::Error;

use super::iri_mappings::IriMappings;
use super::model::{Annotation, Iri, Literal, Ontology, OntologyId, OwlOntology};
use super::query::{QueryResult, SparqlQuery};
use super::vocab::{is_structural_predicate, OWL_ONTOLOGY, OWL_VERSION_IRI, RDF_TYPE};
use crate::config::{MissingImports, TransformConfig};
use crate::report::Diagnostics;

const OWL_XML_MEDIA_TYPE: &str = "application/owl+xml";
const OWL_NAMESPACE: &str = "http://www.w3.org/2002/07/owl#";
const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

const RDF_ACCEPT: &str =
    "application/rdf+xml, text/turtle;q=0.9, application/n-triples;q=0.8, */*;q=0.1";

#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("Failed to load ontology: {0}")]
    LoadError(String),

    #[error("Failed to parse RDF: {0}")]
    ParseError(String),

    #[error("Ontology not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Oxigraph error: {0}")]
    StoreError(String),

    #[error("Import could not be loaded: {0}")]
    ImportError(String),

    #[error("Unsupported ontology format: {0}")]
    UnsupportedFormat(String),
}

/// Loads a root ontology plus everything it transitively imports.
///
/// The closure is kept in load order: the root first, then imports
/// breadth-first in declaration order.
pub struct OntologyLibrary {
    mappings: IriMappings,
    missing_imports: MissingImports,
    fetch_remote_imports: bool,
    http: reqwest::Client,
    ontologies: Vec<OwlOntology>,
    requested: HashSet<String>,
    registered: HashSet<String>,
}

impl OntologyLibrary {
    pub fn new(mappings: IriMappings, config: &TransformConfig) -> Self {
        Self {
            mappings,
            missing_imports: config.missing_imports,
            fetch_remote_imports: config.fetch_remote_imports,
            http: reqwest::Client::new(),
            ontologies: Vec::new(),
            requested: HashSet::new(),
            registered: HashSet::new(),
        }
    }

    /// Load the root document and its import closure.
    ///
    /// Returns the number of ontologies in the closure.
    pub async fn load_root<P: AsRef<Path>>(
        &mut self,
        path: P,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize, OntologyError> {
        let path = path.as_ref();
        tracing::info!("Loading ontology from file {}", path.display());

        let root = load_file(path).await?;
        self.register(root, diagnostics);
        self.load_imports(diagnostics).await?;

        Ok(self.ontologies.len())
    }

    /// Loaded ontologies, root first
    pub fn closure(&self) -> &[OwlOntology] {
        &self.ontologies
    }

    pub fn into_closure(self) -> Vec<OwlOntology> {
        self.ontologies
    }

    fn register(&mut self, ontology: OwlOntology, diagnostics: &mut Diagnostics) {
        if let Some(iri) = ontology.iri() {
            if !self.registered.insert(iri.to_string()) {
                diagnostics.info(
                    iri.as_str(),
                    "Ontology already loaded from another document, ignoring duplicate",
                );
                return;
            }
            self.requested.insert(iri.to_string());
        }
        self.ontologies.push(ontology);
    }

    async fn load_imports(&mut self, diagnostics: &mut Diagnostics) -> Result<(), OntologyError> {
        let mut queue: VecDeque<Iri> = self
            .ontologies
            .iter()
            .flat_map(|o| o.imports().iter().cloned())
            .collect();

        while let Some(import) = queue.pop_front() {
            if !self.requested.insert(import.to_string()) {
                continue;
            }

            match self.load_import(&import).await {
                Ok(ontology) => {
                    queue.extend(ontology.imports().iter().cloned());
                    self.register(ontology, diagnostics);
                }
                Err(e) => match self.missing_imports {
                    MissingImports::Fail => {
                        return Err(OntologyError::ImportError(format!("{} ({})", import, e)));
                    }
                    MissingImports::Skip => diagnostics.warn(
                        import.as_str(),
                        format!("Skipping import that could not be loaded: {}", e),
                    ),
                },
            }
        }

        Ok(())
    }

    /// Resolve an `owl:imports` target: redirection first, then `file:`
    /// IRIs, then HTTP.
    async fn load_import(&self, import: &Iri) -> Result<OwlOntology, OntologyError> {
        let iri = import.as_str();

        if let Some(local) = self.mappings.resolve(iri) {
            tracing::info!("Loading import {} from {}", iri, local.display());
            return load_file(local).await;
        }

        if let Some(path) = iri.strip_prefix("file://") {
            return load_file(Path::new(path)).await;
        }

        if iri.starts_with("http://") || iri.starts_with("https://") {
            if !self.fetch_remote_imports {
                return Err(OntologyError::LoadError(format!(
                    "No IRI mapping for {} and remote imports are disabled",
                    iri
                )));
            }
            return self.fetch(iri).await;
        }

        Err(OntologyError::LoadError(format!(
            "Unsupported import IRI: {} (expected file:// or http(s)://)",
            iri
        )))
    }

    async fn fetch(&self, iri: &str) -> Result<OwlOntology, OntologyError> {
        use reqwest::header::{ACCEPT, CONTENT_TYPE};

        tracing::info!("Fetching remote ontology {}", iri);

        let response = self
            .http
            .get(iri)
            .header(ACCEPT, RDF_ACCEPT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OntologyError::LoadError(e.to_string()))?;

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let final_url = response.url().to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| OntologyError::LoadError(e.to_string()))?;

        let format = detect_format(&final_url, &body, media_type.as_deref())?;
        read_ontology(&body, format, Some(iri), iri)
    }
}

async fn load_file(path: &Path) -> Result<OwlOntology, OntologyError> {
    if !path.exists() {
        return Err(OntologyError::NotFound(format!("File not found: {}", path.display())));
    }

    if path.is_dir() {
        return Err(OntologyError::LoadError(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    let content = tokio::fs::read(path).await?;
    let location = path.display().to_string();
    let base = std::fs::canonicalize(path)
        .ok()
        .map(|p| format!("file://{}", p.display()));

    let format = detect_format(&location, &content, None)?;
    read_ontology(&content, format, base.as_deref(), &location)
}

/// Pick a parser from the media type, then the file extension, then by
/// sniffing the content (XML → RDF/XML, anything else → Turtle).
///
/// OWL/XML and OWL functional syntax documents are recognised and rejected,
/// as only RDF serializations can be read.
pub fn detect_format(
    location: &str,
    content: &[u8],
    media_type: Option<&str>,
) -> Result<RdfFormat, OntologyError> {
    let head = String::from_utf8_lossy(&content[..content.len().min(4096)]);
    let head = head.trim_start_matches('\u{feff}').trim_start();

    let owl_xml = media_type.is_some_and(|m| m.eq_ignore_ascii_case(OWL_XML_MEDIA_TYPE));
    if let Some(syntax) = owl_xml.then_some("OWL/XML").or_else(|| non_rdf_syntax(head)) {
        return Err(OntologyError::UnsupportedFormat(format!(
            "{} is {}; convert it to RDF/XML or Turtle",
            location, syntax
        )));
    }

    if let Some(format) = media_type.and_then(RdfFormat::from_media_type) {
        return Ok(format);
    }

    let file_name = location
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(location)
        .rsplit('/')
        .next()
        .unwrap_or(location);
    // .owl is used for every OWL serialization, so it says nothing about the syntax
    if let Some(format) = file_name
        .rsplit_once('.')
        .filter(|(_, ext)| !ext.eq_ignore_ascii_case("owl"))
        .and_then(|(_, ext)| RdfFormat::from_extension(ext))
    {
        return Ok(format);
    }

    if head.starts_with("<?xml") || head.starts_with("<rdf:RDF") || head.starts_with("<!") {
        Ok(RdfFormat::RdfXml)
    } else {
        Ok(RdfFormat::Turtle)
    }
}

/// Name of the OWL syntax `head` opens with, when it is not an RDF one
fn non_rdf_syntax(head: &str) -> Option<&'static str> {
    if head.starts_with("Prefix(") || head.starts_with("Ontology(") {
        return Some("OWL functional syntax");
    }

    let tag = root_element(head)?;
    let name = tag
        .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or(tag);
    let is_ontology = name == "Ontology" || name.ends_with(":Ontology");
    // RDF/XML may use owl:Ontology as its root node element
    (is_ontology && tag.contains(OWL_NAMESPACE) && !tag.contains(RDF_NAMESPACE))
        .then_some("OWL/XML")
}

/// Opening tag of the first XML element, skipping the declaration,
/// comments and the doctype
fn root_element(head: &str) -> Option<&str> {
    let mut rest = head;
    loop {
        rest = &rest[rest.find('<')? + 1..];
        if let Some(comment) = rest.strip_prefix("!--") {
            rest = &comment[comment.find("-->")? + 3..];
        } else if rest.starts_with('?') || rest.starts_with('!') {
            rest = &rest[rest.find('>')? + 1..];
        } else {
            return Some(&rest[..rest.find('>').unwrap_or(rest.len())]);
        }
    }
}

/// Parse one RDF document into an [`OwlOntology`].
pub fn read_ontology(
    content: &[u8],
    format: RdfFormat,
    base_iri: Option<&str>,
    location: &str,
) -> Result<OwlOntology, OntologyError> {
    let graph = DocumentGraph::parse(content, format, base_iri)?;

    let mut ontology = OwlOntology::new(graph.ontology_id());
    ontology.set_location(location);

    let header = graph.ontology_subject();
    let mut class_annotations: HashMap<&str, Vec<Annotation>> = HashMap::new();
    for quad in &graph.quads {
        let Some(annotation) = annotation_of(quad) else {
            continue;
        };
        if header.as_ref() == Some(&quad.subject) {
            ontology.annotate(annotation);
        } else if let Subject::NamedNode(node) = &quad.subject {
            class_annotations.entry(node.as_str()).or_default().push(annotation);
        }
    }

    for row in graph.query_sparql(&SparqlQuery::imports())? {
        if let Some(iri) = row.get("import").and_then(|v| Iri::new(v.as_str()).ok()) {
            ontology.add_import(iri);
        }
    }

    for row in graph.query_sparql(&SparqlQuery::signature_classes())? {
        let Some(class) = row.get("class") else {
            continue;
        };
        let iri = Iri::new(class.as_str())
            .map_err(|e| OntologyError::ParseError(e.to_string()))?;
        ontology.declare_class(iri.clone());
        for annotation in class_annotations.remove(class.as_str()).unwrap_or_default() {
            ontology.annotate_class(iri.clone(), annotation);
        }
    }

    let mut subclass_axioms = graph.named_pairs(&SparqlQuery::named_subclass_axioms(), "sub", "super")?;
    subclass_axioms.sort();
    for (sub, sup) in subclass_axioms {
        ontology.add_subclass_of(sub, sup);
    }

    let mut equivalences = graph.named_pairs(&SparqlQuery::named_equivalence_axioms(), "left", "right")?;
    equivalences.sort();
    for (left, right) in equivalences {
        ontology.add_equivalent_class(left, right);
    }

    tracing::debug!(
        "Read {} ({} classes, {} imports)",
        location,
        ontology.classes().len(),
        ontology.imports().len()
    );

    Ok(ontology)
}

/// Reads a non-structural triple as an annotation assertion
fn annotation_of(quad: &Quad) -> Option<Annotation> {
    if is_structural_predicate(quad.predicate.as_str()) {
        return None;
    }

    let property = Iri::from(quad.predicate.clone());
    match &quad.object {
        Term::Literal(literal) => Some(Annotation::literal(
            property,
            Literal {
                lexical: literal.value().to_string(),
                datatype: literal.datatype().as_str().to_string(),
                language: literal.language().map(str::to_string),
            },
        )),
        Term::NamedNode(node) => Some(Annotation::iri(property, Iri::from(node.clone()))),
        _ => None,
    }
}

/// A parsed document: quads in document order plus a store for SPARQL
struct DocumentGraph {
    store: Store,
    quads: Vec<Quad>,
}

impl DocumentGraph {
    fn parse(content: &[u8], format: RdfFormat, base_iri: Option<&str>) -> Result<Self, OntologyError> {
        let mut parser = RdfParser::from_format(format);
        if let Some(base) = base_iri.filter(|b| NamedNode::new(*b).is_ok()) {
            parser = parser
                .with_base_iri(base)
                .map_err(|e| OntologyError::ParseError(e.to_string()))?;
        }

        let quads = parser
            .for_reader(content)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| OntologyError::ParseError(e.to_string()))?;

        let store = Store::new().map_err(|e| OntologyError::StoreError(e.to_string()))?;
        for quad in &quads {
            store
                .insert(quad)
                .map_err(|e| OntologyError::StoreError(e.to_string()))?;
        }

        Ok(Self { store, quads })
    }

    /// Subject of the first `rdf:type owl:Ontology` triple
    fn ontology_subject(&self) -> Option<Subject> {
        self.quads
            .iter()
            .find(|q| {
                q.predicate.as_str() == RDF_TYPE
                    && matches!(&q.object, Term::NamedNode(n) if n.as_str() == OWL_ONTOLOGY)
            })
            .map(|q| q.subject.clone())
    }

    fn ontology_id(&self) -> OntologyId {
        let Some(subject) = self.ontology_subject() else {
            return OntologyId::anonymous();
        };

        let version_iri = self
            .quads
            .iter()
            .filter(|q| q.subject == subject && q.predicate.as_str() == OWL_VERSION_IRI)
            .find_map(|q| match &q.object {
                Term::NamedNode(node) => Some(Iri::from(node.clone())),
                _ => None,
            });

        let iri = match subject {
            Subject::NamedNode(node) => Some(Iri::from(node)),
            _ => None,
        };

        OntologyId { iri, version_iri }
    }

    fn named_pairs(
        &self,
        query: &SparqlQuery,
        left: &str,
        right: &str,
    ) -> Result<Vec<(Iri, Iri)>, OntologyError> {
        let mut pairs = Vec::new();
        for row in self.query_sparql(query)? {
            if let (Some(l), Some(r)) = (row.get(left), row.get(right)) {
                let l = Iri::new(l.as_str()).map_err(|e| OntologyError::ParseError(e.to_string()))?;
                let r = Iri::new(r.as_str()).map_err(|e| OntologyError::ParseError(e.to_string()))?;
                pairs.push((l, r));
            }
        }
        Ok(pairs)
    }

    /// Execute SPARQL query; IRIs are returned without angle brackets and
    /// literals as their lexical form.
    fn query_sparql(&self, query: &SparqlQuery) -> Result<Vec<QueryResult>, OntologyError> {
        let results = self
            .store
            .query(query.as_str())
            .map_err(|e| OntologyError::QueryError(e.to_string()))?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();

                for solution in solutions {
                    let solution = solution.map_err(|e| OntologyError::QueryError(e.to_string()))?;

                    let mut row = HashMap::new();
                    for (var, term) in solution.iter() {
                        let value = match term {
                            Term::NamedNode(node) => node.as_str().to_string(),
                            Term::Literal(literal) => literal.value().to_string(),
                            _ => continue,
                        };
                        row.insert(var.as_str().to_string(), value);
                    }

                    rows.push(row);
                }

                Ok(rows)
            }
            QueryResults::Boolean(result) => {
                let mut row = HashMap::new();
                row.insert("result".to_string(), result.to_string());
                Ok(vec![row])
            }
            QueryResults::Graph(_) => Err(OntologyError::QueryError(
                "Graph queries not supported".to_string(),
            )),
        }
    }
}
