//! Integration tests for the OWL → FHIR transformation
//!
//! Runs `transform` end to end on small Turtle and RDF/XML documents and
//! checks the written bundle:
//! - Single ontology with labelled classes
//! - Preferred term and synonym selection
//! - Hierarchy, root and deprecated properties
//! - Code system overrides and concept options
//! - Empty and anonymous ontologies
//! - Byte-identical output across runs

use fhir_owl::{
    transform, CodeReplace, CodeSystemOverrides, ConceptOptions, FhirOwlError, PublicationStatus,
    Severity, TransformConfig,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ==================== Test Helper Functions ====================

const PREFIXES: &str = r#"@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix dc: <http://purl.org/dc/elements/1.1/> .
@prefix oboInOwl: <http://www.geneontology.org/formats/oboInOwl#> .
"#;

/// Write a Turtle document with the common prefixes
fn write_ttl(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("{}\n{}", PREFIXES, body)).unwrap();
    path
}

/// Offline configuration with no redirection file
fn config() -> TransformConfig {
    TransformConfig::default()
        .with_iri_mappings(None)
        .with_remote_imports(false)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn entries(bundle: &Value) -> Vec<Value> {
    bundle["entry"].as_array().cloned().unwrap_or_default()
}

fn concept<'a>(code_system: &'a Value, code: &str) -> &'a Value {
    code_system["concept"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["code"] == code)
        .unwrap_or_else(|| panic!("concept {} not found", code))
}

fn property<'a>(concept: &'a Value, code: &str) -> Vec<&'a Value> {
    concept["property"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["code"] == code)
        .collect()
}

fn synonyms(concept: &Value) -> Vec<String> {
    concept["designation"]
        .as_array()
        .map(|d| {
            d.iter()
                .map(|d| d["value"].as_str().unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}

// ==================== Single Ontology ====================

#[tokio::test]
async fn test_single_labelled_class() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_ttl(
        temp_dir.path(),
        "onto.ttl",
        r#"<http://x.org/onto> a owl:Ontology .
<http://x.org/onto#Foo> a owl:Class ;
    rdfs:label "Foo Label" .
"#,
    );
    let output = temp_dir.path().join("bundle.json");

    let report = transform(&input, &output, &config()).await.unwrap();

    assert_eq!(report.ontologies, 1);
    assert_eq!(report.code_systems.len(), 1);
    assert_eq!(report.total_concepts(), 1);

    let bundle = read_json(&output);
    assert_eq!(bundle["resourceType"], "Bundle");
    assert_eq!(bundle["type"], "batch");

    let entries = entries(&bundle);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["request"]["method"], "PUT");
    assert_eq!(entries[0]["request"]["url"], "CodeSystem/onto");

    let cs = &entries[0]["resource"];
    assert_eq!(cs["url"], "http://x.org/onto");
    assert_eq!(cs["version"], "NA");
    assert_eq!(cs["name"], "http://x.org/onto");
    assert_eq!(cs["status"], "active");
    assert_eq!(cs["content"], "complete");
    assert_eq!(cs["hierarchyMeaning"], "is-a");

    let foo = concept(cs, "Foo");
    assert_eq!(foo["display"], "Foo Label");
    assert!(synonyms(foo).is_empty());
    assert!(property(foo, "parent").is_empty());
    assert_eq!(property(foo, "root")[0]["valueBoolean"], false);
    assert_eq!(property(foo, "deprecated")[0]["valueBoolean"], false);
}

#[tokio::test]
async fn test_ontology_metadata() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_ttl(
        temp_dir.path(),
        "onto.ttl",
        r#"<http://x.org/onto> a owl:Ontology ;
    owl:versionIRI <http://x.org/onto/releases/2024-05-01> ;
    rdfs:label "Example Ontology" ;
    dc:publisher "Example Org" ;
    rdfs:comment "An example." ;
    dc:source <http://purl.obolibrary.org/obo/go.owl> .
<http://x.org/onto#Foo> a owl:Class .
"#,
    );
    let output = temp_dir.path().join("bundle.json");

    transform(&input, &output, &config()).await.unwrap();

    let bundle = read_json(&output);
    let entries = entries(&bundle);
    let cs = &entries[0]["resource"];
    assert_eq!(cs["version"], "http://x.org/onto/releases/2024-05-01");
    assert_eq!(cs["name"], "Example Ontology");
    assert_eq!(cs["id"], "Example-Ontology");
    assert_eq!(cs["publisher"], "Example Org");
    assert_eq!(cs["description"], "An example.");
    assert_eq!(cs["content"], "fragment");
    assert_eq!(entries[0]["request"]["url"], "CodeSystem/Example-Ontology");
}

#[tokio::test]
async fn test_overrides_and_concept_options() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_ttl(
        temp_dir.path(),
        "hp.ttl",
        r#"@prefix obo: <http://purl.obolibrary.org/obo/> .
<http://x.org/hp> a owl:Ontology ;
    rdfs:label "HPO" .
<http://x.org/hp#HP_0001> a owl:Class ;
    rdfs:label "All" .
<http://x.org/hp#HP_0002> a owl:Class ;
    rdfs:subClassOf <http://x.org/hp#HP_0001> ;
    rdfs:label "Abnormality" ;
    obo:IAO_0000115 "A deviation from normal." .
<http://x.org/hp#HP_0003> a owl:Class ;
    rdfs:label "obsolete Abnormality" ;
    owl:deprecated true .
"#,
    );
    let output = temp_dir.path().join("bundle.json");
    let config = config()
        .with_code_system(CodeSystemOverrides {
            id: Some("hpo".to_string()),
            url: Some("http://example.org/fhir/CodeSystem/hpo".to_string()),
            title: Some("Human Phenotype Ontology".to_string()),
            status: Some(PublicationStatus::Draft),
            date: Some("2024-04-26".to_string()),
            ..Default::default()
        })
        .with_concepts(ConceptOptions {
            code_replace: Some(CodeReplace::parse("_,:").unwrap()),
            definition_property: Some("http://purl.obolibrary.org/obo/IAO_0000115".to_string()),
            include_deprecated: false,
            ..Default::default()
        });

    transform(&input, &output, &config).await.unwrap();

    let bundle = read_json(&output);
    let entries = entries(&bundle);
    assert_eq!(entries[0]["request"]["url"], "CodeSystem/hpo");
    let cs = &entries[0]["resource"];
    assert_eq!(cs["id"], "hpo");
    assert_eq!(cs["url"], "http://example.org/fhir/CodeSystem/hpo");
    assert_eq!(cs["valueSet"], "http://example.org/fhir/CodeSystem/hpo");
    assert_eq!(cs["name"], "HPO");
    assert_eq!(cs["title"], "Human Phenotype Ontology");
    assert_eq!(cs["status"], "draft");
    assert_eq!(cs["date"], "2024-04-26");

    let abnormality = concept(cs, "HP:0002");
    assert_eq!(abnormality["definition"], "A deviation from normal.");
    let parents = property(abnormality, "parent");
    assert_eq!(parents[0]["valueCoding"]["system"], "http://example.org/fhir/CodeSystem/hpo");
    assert_eq!(parents[0]["valueCoding"]["code"], "HP:0001");

    let codes: Vec<&Value> = cs["concept"].as_array().unwrap().iter().map(|c| &c["code"]).collect();
    assert!(!codes.contains(&&Value::from("HP:0003")));
}

#[tokio::test]
async fn test_labels_and_synonyms() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_ttl(
        temp_dir.path(),
        "onto.ttl",
        r#"<http://x.org/onto> a owl:Ontology .
<http://x.org/onto#Multi> a owl:Class ;
    rdfs:label "A" ;
    rdfs:label "B" ;
    oboInOwl:hasExactSynonym "C" .
<http://x.org/onto#SynonymsOnly> a owl:Class ;
    oboInOwl:hasExactSynonym "zeta" ;
    oboInOwl:hasExactSynonym "alpha" .
<http://x.org/onto#Bare> a owl:Class .
"#,
    );
    let output = temp_dir.path().join("bundle.json");

    transform(&input, &output, &config()).await.unwrap();

    let bundle = read_json(&output);
    let entries = entries(&bundle);
    let cs = &entries[0]["resource"];

    let multi = concept(cs, "Multi");
    assert_eq!(multi["display"], "A");
    assert_eq!(synonyms(multi), vec!["B", "C"]);
    assert_eq!(multi["designation"][0]["use"]["code"], "900000000000013009");

    let synonyms_only = concept(cs, "SynonymsOnly");
    assert_eq!(synonyms_only["display"], "alpha");
    assert_eq!(synonyms(synonyms_only), vec!["zeta"]);

    let bare = concept(cs, "Bare");
    assert_eq!(bare["display"], "Bare");
    assert!(bare.get("designation").is_none());
}

#[tokio::test]
async fn test_hierarchy_root_and_deprecated() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_ttl(
        temp_dir.path(),
        "onto.ttl",
        r#"<http://x.org/onto> a owl:Ontology .
<http://x.org/onto#Everything> a owl:Class ;
    owl:equivalentClass owl:Thing .
<http://x.org/onto#Animal> a owl:Class .
<http://x.org/onto#Dog> a owl:Class ;
    rdfs:subClassOf <http://x.org/onto#Mammal> , <http://x.org/onto#Animal> .
<http://x.org/onto#Mammal> a owl:Class ;
    rdfs:subClassOf <http://x.org/onto#Animal> .
<http://x.org/onto#Old> a owl:Class ;
    owl:deprecated true .
<http://x.org/onto#Odd> a owl:Class ;
    owl:deprecated "sometimes" .
"#,
    );
    let output = temp_dir.path().join("bundle.json");

    let report = transform(&input, &output, &config()).await.unwrap();

    let bundle = read_json(&output);
    let entries = entries(&bundle);
    let cs = &entries[0]["resource"];

    // Animal is reachable through Mammal, so only Mammal is a direct parent
    let dog = concept(cs, "Dog");
    let parents = property(dog, "parent");
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0]["valueCoding"]["system"], "http://x.org/onto");
    assert_eq!(parents[0]["valueCoding"]["code"], "Mammal");

    let everything = concept(cs, "Everything");
    assert_eq!(property(everything, "root")[0]["valueBoolean"], true);

    // owl:Thing is referenced in this ontology's signature
    let thing = concept(cs, "Thing");
    assert_eq!(thing["display"], "Thing");
    assert_eq!(property(thing, "root")[0]["valueBoolean"], true);
    assert!(property(thing, "parent").is_empty());

    // Top-level classes sit under owl:Thing but are not roots themselves
    let animal = concept(cs, "Animal");
    assert_eq!(property(animal, "root")[0]["valueBoolean"], false);
    assert_eq!(property(dog, "root")[0]["valueBoolean"], false);

    assert_eq!(property(concept(cs, "Old"), "deprecated")[0]["valueBoolean"], true);
    assert_eq!(property(concept(cs, "Odd"), "deprecated")[0]["valueBoolean"], false);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.subject == "http://x.org/onto#Odd"));
}

#[tokio::test]
async fn test_rdf_xml_input() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("onto.owl");
    fs::write(
        &input,
        r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"
         xmlns:owl="http://www.w3.org/2002/07/owl#">
  <owl:Ontology rdf:about="http://x.org/onto"/>
  <owl:Class rdf:about="http://x.org/onto#Foo">
    <rdfs:label>Foo Label</rdfs:label>
  </owl:Class>
</rdf:RDF>
"#,
    )
    .unwrap();
    let output = temp_dir.path().join("bundle.json");

    transform(&input, &output, &config()).await.unwrap();

    let bundle = read_json(&output);
    let entries = entries(&bundle);
    assert_eq!(concept(&entries[0]["resource"], "Foo")["display"], "Foo Label");
}

// ==================== Skipped Ontologies ====================

#[tokio::test]
async fn test_ontology_without_classes_is_excluded() {
    let temp_dir = TempDir::new().unwrap();
    let empty = write_ttl(
        temp_dir.path(),
        "empty.ttl",
        "<http://x.org/empty> a owl:Ontology .\n",
    );
    let input = write_ttl(
        temp_dir.path(),
        "onto.ttl",
        &format!(
            r#"<http://x.org/onto> a owl:Ontology ;
    owl:imports <file://{}> .
<http://x.org/onto#Foo> a owl:Class .
"#,
            empty.display()
        ),
    );
    let output = temp_dir.path().join("bundle.json");

    let report = transform(&input, &output, &config()).await.unwrap();

    assert_eq!(report.ontologies, 2);
    assert_eq!(report.code_systems.len(), 1);
    assert_eq!(report.code_systems[0].url, "http://x.org/onto");
    assert_eq!(entries(&read_json(&output)).len(), 1);
}

#[tokio::test]
async fn test_anonymous_ontology_does_not_abort() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_ttl(
        temp_dir.path(),
        "anonymous.ttl",
        r#"<http://x.org/anon#Foo> a owl:Class ;
    rdfs:label "Foo" .
"#,
    );
    let output = temp_dir.path().join("bundle.json");

    let report = transform(&input, &output, &config()).await.unwrap();

    assert!(report.code_systems.is_empty());
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.message.contains("no IRI")));

    let bundle = read_json(&output);
    assert_eq!(bundle["type"], "batch");
    assert!(entries(&bundle).is_empty());
}

// ==================== Failures ====================

#[tokio::test]
async fn test_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("bundle.json");

    let result = transform(temp_dir.path().join("missing.ttl"), &output, &config()).await;

    assert!(matches!(result, Err(FhirOwlError::FileNotFound(_))));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_malformed_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_ttl(temp_dir.path(), "broken.ttl", "<http://x.org/onto> a owl:Ontology");
    let output = temp_dir.path().join("bundle.json");

    let result = transform(&input, &output, &config()).await;

    assert!(matches!(result, Err(FhirOwlError::Ontology(_))));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_owl_xml_input_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("onto.owl");
    fs::write(
        &input,
        r#"<?xml version="1.0"?>
<Ontology xmlns="http://www.w3.org/2002/07/owl#" ontologyIRI="http://x.org/onto">
    <Declaration><Class IRI="http://x.org/onto#A"/></Declaration>
</Ontology>
"#,
    )
    .unwrap();
    let output = temp_dir.path().join("bundle.json");

    let result = transform(&input, &output, &config()).await;

    assert!(matches!(result, Err(FhirOwlError::Ontology(msg)) if msg.contains("OWL/XML")));
    assert!(!output.exists());
}

// ==================== Determinism ====================

#[tokio::test]
async fn test_repeated_runs_are_byte_identical() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_ttl(
        temp_dir.path(),
        "onto.ttl",
        r#"<http://x.org/onto> a owl:Ontology .
<http://x.org/onto#Z> a owl:Class ;
    rdfs:subClassOf <http://x.org/onto#B> , <http://x.org/onto#A> ;
    rdfs:label "Zed" ;
    oboInOwl:hasExactSynonym "zz" , "last" , "first" .
<http://x.org/onto#A> a owl:Class .
<http://x.org/onto#B> a owl:Class .
"#,
    );
    let first = temp_dir.path().join("first.json");
    let second = temp_dir.path().join("second.json");

    transform(&input, &first, &config()).await.unwrap();
    transform(&input, &second, &config()).await.unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());

    let bundle = read_json(&first);
    let entries = entries(&bundle);
    let z = concept(&entries[0]["resource"], "Z");
    assert_eq!(synonyms(z), vec!["first", "last", "zz"]);
    let parent_codes: Vec<&Value> = property(z, "parent")
        .into_iter()
        .map(|p| &p["valueCoding"]["code"])
        .collect();
    assert_eq!(parent_codes, vec!["A", "B"]);
}
