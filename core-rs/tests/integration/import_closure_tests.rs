//! Integration tests for import closures
//!
//! Covers:
//! - Redirecting `owl:imports` through an IRI mappings file
//! - OBO prefix resolution across ontologies of the closure
//! - Parent references pointing into imported code systems
//! - Missing imports with `fail` and `skip` strategies

use fhir_owl::{transform, FhirOwlError, MissingImports, Severity, TransformConfig};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ==================== Test Helper Functions ====================

const HP: &str = "http://purl.obolibrary.org/obo/hp.owl";

const PREFIXES: &str = r#"@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix obo: <http://purl.obolibrary.org/obo/> .
"#;

fn write_ttl(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("{}\n{}", PREFIXES, body)).unwrap();
    path
}

/// Root ontology importing HP, with one local class under an HP class
fn write_root(dir: &Path) -> PathBuf {
    write_ttl(
        dir,
        "root.ttl",
        r#"<http://x.org/onto> a owl:Ontology ;
    rdfs:label "Root Ontology" ;
    owl:imports <http://purl.obolibrary.org/obo/hp.owl> .
<http://x.org/onto#Local> a owl:Class ;
    rdfs:label "Local finding" ;
    rdfs:subClassOf obo:HP_0000118 .
obo:HP_0000118 a owl:Class .
"#,
    )
}

/// Local copy of HP, importing the root back
fn write_hp(dir: &Path) -> PathBuf {
    write_ttl(
        dir,
        "hp.ttl",
        r#"<http://purl.obolibrary.org/obo/hp.owl> a owl:Ontology ;
    owl:imports <http://x.org/onto> .
obo:HP_0000001 a owl:Class ;
    rdfs:label "All" .
obo:HP_0000118 a owl:Class ;
    rdfs:label "Phenotypic abnormality" ;
    rdfs:subClassOf obo:HP_0000001 .
"#,
    )
}

fn write_mappings(dir: &Path, lines: &[String]) -> PathBuf {
    let path = dir.join("iri_mappings.txt");
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn config(mappings: Option<PathBuf>) -> TransformConfig {
    TransformConfig::default()
        .with_iri_mappings(mappings)
        .with_remote_imports(false)
}

fn code_system<'a>(bundle: &'a Value, url: &str) -> &'a Value {
    bundle["entry"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| &e["resource"])
        .find(|cs| cs["url"] == url)
        .unwrap_or_else(|| panic!("code system {} not found", url))
}

fn codes(code_system: &Value) -> Vec<String> {
    code_system["concept"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap().to_string())
        .collect()
}

// ==================== Redirected Imports ====================

#[tokio::test]
async fn test_obo_classes_are_placed_in_their_ontology() {
    let temp_dir = TempDir::new().unwrap();
    let root = write_root(temp_dir.path());
    let hp = write_hp(temp_dir.path());
    let mappings = write_mappings(
        temp_dir.path(),
        &[
            "# local copies".to_string(),
            format!("{},{}", HP, hp.display()),
            format!("http://x.org/onto,{}", root.display()),
        ],
    );
    let output = temp_dir.path().join("bundle.json");

    let report = transform(&root, &output, &config(Some(mappings))).await.unwrap();

    // The cycle back to the root does not load it twice
    assert_eq!(report.ontologies, 2);
    assert_eq!(report.code_systems.len(), 2);
    assert_eq!(report.warning_count(), 0);

    let bundle: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();

    let root_cs = code_system(&bundle, "http://x.org/onto");
    assert_eq!(codes(root_cs), vec!["Local"]);
    assert_eq!(root_cs["id"], "Root-Ontology");

    let hp_cs = code_system(&bundle, HP);
    assert_eq!(codes(hp_cs), vec!["HP_0000001", "HP_0000118"]);
    assert_eq!(hp_cs["id"], "hp-owl");

    // Parent references use the system of the parent, not of the child
    let local = &root_cs["concept"][0];
    assert_eq!(local["property"][0]["code"], "parent");
    assert_eq!(local["property"][0]["valueCoding"]["system"], HP);
    assert_eq!(local["property"][0]["valueCoding"]["code"], "HP_0000118");

    let abnormality = &hp_cs["concept"][1];
    assert_eq!(abnormality["display"], "Phenotypic abnormality");
    assert_eq!(abnormality["property"][0]["valueCoding"]["code"], "HP_0000001");
}

#[tokio::test]
async fn test_malformed_mapping_lines_are_reported() {
    let temp_dir = TempDir::new().unwrap();
    let root = write_root(temp_dir.path());
    let hp = write_hp(temp_dir.path());
    let mappings = write_mappings(
        temp_dir.path(),
        &[
            "not-a-mapping".to_string(),
            format!("{},{}", HP, hp.display()),
        ],
    );
    let output = temp_dir.path().join("bundle.json");

    let report = transform(&root, &output, &config(Some(mappings))).await.unwrap();

    assert_eq!(report.code_systems.len(), 2);
    let warnings: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].subject.ends_with("iri_mappings.txt:1"));
}

// ==================== Missing Imports ====================

#[tokio::test]
async fn test_missing_import_fails_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let root = write_root(temp_dir.path());
    let output = temp_dir.path().join("bundle.json");

    let result = transform(&root, &output, &config(None)).await;

    match result {
        Err(FhirOwlError::ImportLoad(msg)) => assert!(msg.contains(HP)),
        other => panic!("Expected ImportLoad, got {:?}", other),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_import_can_be_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let root = write_root(temp_dir.path());
    let output = temp_dir.path().join("bundle.json");

    let config = config(None).with_missing_imports(MissingImports::Skip);
    let report = transform(&root, &output, &config).await.unwrap();

    assert_eq!(report.ontologies, 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.subject == HP));

    // Without hp.owl in the closure, HP_0000118 has no known prefix and
    // falls back to the root ontology
    let bundle: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let root_cs = code_system(&bundle, "http://x.org/onto");
    assert_eq!(codes(root_cs), vec!["HP_0000118", "Local"]);
}
