// Concept Contract Tests
//
// These tests verify the invariants of individual concepts: label
// selection, synonym sets, parent references and flags.

use fhir_owl::ontology::vocab::{OWL_THING, RDFS_LABEL};
use fhir_owl::ontology::{Annotation, Literal};
use fhir_owl::transform::{ConceptAssembler, PrefixTable, SystemMap};
use fhir_owl::{
    build_bundle, ConceptRecord, Diagnostics, Iri, Ontology, OntologyId, OwlOntology,
    StructuralReasoner, TransformConfig,
};

const ROOT: &str = "http://x.org/onto";
const EXACT_SYNONYM: &str = "http://www.geneontology.org/formats/oboInOwl#hasExactSynonym";

fn iri(value: &str) -> Iri {
    Iri::new(value).unwrap()
}

fn ex(name: &str) -> Iri {
    iri(&format!("{}#{}", ROOT, name))
}

fn label(value: &str) -> Annotation {
    Annotation::literal(iri(RDFS_LABEL), Literal::string(value))
}

fn synonym(value: &str) -> Annotation {
    Annotation::literal(iri(EXACT_SYNONYM), Literal::string(value))
}

fn labelled_ontology() -> OwlOntology {
    let mut ontology = OwlOntology::new(OntologyId::named(iri(ROOT)));
    ontology
        .annotate_class(ex("Scenario"), label("A"))
        .annotate_class(ex("Scenario"), label("B"))
        .annotate_class(ex("Scenario"), synonym("C"))
        .annotate_class(ex("Echo"), label("Same"))
        .annotate_class(ex("Echo"), synonym("Same"))
        .annotate_class(ex("Echo"), synonym("Other"))
        .annotate_class(ex("OnlySynonyms"), synonym("b"))
        .annotate_class(ex("OnlySynonyms"), synonym("a"))
        .add_subclass_of(ex("Scenario"), ex("Echo"))
        .add_subclass_of(ex("Scenario"), ex("OnlySynonyms"))
        .add_equivalent_class(ex("Top"), iri(OWL_THING));
    ontology
}

fn concepts(closure: &[OwlOntology]) -> Vec<ConceptRecord> {
    let mut diagnostics = Diagnostics::new();
    build_bundle(closure, &TransformConfig::default(), &mut diagnostics)
        .unwrap()
        .entries
        .into_iter()
        .flat_map(|e| e.record.concepts)
        .collect()
}

fn find<'a>(concepts: &'a [ConceptRecord], code: &str) -> &'a ConceptRecord {
    concepts.iter().find(|c| c.code == code).unwrap()
}

/// WHY: The preferred term is never repeated as a synonym
/// REASON: Designations are alternatives to the display
/// BREAKS: Search result ranking on servers that index designations
#[test]
fn synonyms_never_contain_display() {
    let concepts = concepts(&[labelled_ontology()]);

    assert!(!concepts.is_empty());
    for concept in &concepts {
        assert!(
            !concept.synonyms.contains(&concept.display),
            "{} repeats its display",
            concept.code
        );
    }
}

/// WHY: First rdfs:label is the display, the rest are synonyms
/// EXAMPLE: labels "A", "B" + exact synonym "C" → display "A", synonyms {B, C}
#[test]
fn first_label_is_preferred() {
    let concepts = concepts(&[labelled_ontology()]);
    let scenario = find(&concepts, "Scenario");

    assert_eq!(scenario.display, "A");
    assert_eq!(
        scenario.synonyms.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["B", "C"]
    );
}

/// WHY: Without rdfs:label the choice is deterministic
/// REASON: The smallest candidate wins so repeated runs agree
#[test]
fn synonym_only_concepts_pick_the_smallest() {
    let concepts = concepts(&[labelled_ontology()]);
    let only = find(&concepts, "OnlySynonyms");

    assert_eq!(only.display, "a");
    assert_eq!(only.synonyms.len(), 1);
    assert!(only.synonyms.contains("b"));
}

/// WHY: Parent references are sorted and unique
/// FORMAT: ordered by (system, code)
/// BREAKS: Reproducible output
#[test]
fn parents_are_sorted_and_unique() {
    let concepts = concepts(&[labelled_ontology()]);

    for concept in &concepts {
        let mut sorted = concept.parents.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(concept.parents, sorted, "{} parents out of order", concept.code);
    }

    let codes: Vec<&str> = find(&concepts, "Scenario")
        .parents
        .iter()
        .map(|p| p.code.as_str())
        .collect();
    assert_eq!(codes, vec!["Echo", "OnlySynonyms"]);
}

/// WHY: root means equivalent to owl:Thing
/// BREAKS: The `root = true` filter used by browsers to find entry points
#[test]
fn root_flag_follows_equivalence_with_thing() {
    let concepts = concepts(&[labelled_ontology()]);

    assert!(find(&concepts, "Top").root);
    assert!(!find(&concepts, "Scenario").root);
    assert_eq!(find(&concepts, "Thing").display, "Thing");
}

/// WHY: Parents outside every known system are dropped, not invented
/// REASON: A parent coding must point at a concept of some code system
#[test]
fn parents_without_system_are_dropped() {
    let mut ontology = OwlOntology::new(OntologyId::named(iri(ROOT)));
    ontology.declare_class(ex("Orphan"));
    let closure = vec![ontology];

    let mut diagnostics = Diagnostics::new();
    let prefixes = PrefixTable::build(&closure, &mut diagnostics);
    let systems = SystemMap::build(&closure, &prefixes).unwrap();
    let reasoner = StructuralReasoner::classify(&closure);

    let record = ConceptAssembler::new(&reasoner, &systems).assemble(
        &closure[0],
        &ex("Orphan"),
        &mut diagnostics,
    );

    // The implicit owl:Thing parent has no system here
    assert!(record.parents.is_empty());
    assert!(closure[0].classes().iter().all(|c| c.as_str() != OWL_THING));
}
