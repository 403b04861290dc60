/**
 * transform module
 * OWL import closure → FHIR CodeSystem bundle
 *
 * - annotations: literal annotation index
 * - system: OBO prefix table and class → system map
 * - concept: class → concept record
 * - code_system: ontology → code system record
 * - bundle: record filtering, resource ids, batch packaging
 *
 * Flow: build the per-run context once, classify once, assemble one code
 * system per ontology of the closure, dispose the reasoner, package.
 */

pub mod annotations;
pub mod bundle;
pub mod code_system;
pub mod concept;
pub mod system;

pub use annotations::AnnotationIndex;
pub use bundle::{resource_id, BundleAssembler, CodeSystemBundle, PackagedCodeSystem};
pub use code_system::{CodeSystemAssembler, CodeSystemRecord, ContentMode};
pub use concept::{CodeTable, ConceptAssembler, ConceptRecord, ParentRef};
pub use system::{resolve_system, PrefixTable, SystemMap};

use std::path::Path;

use crate::config::{CodeSystemOverrides, TransformConfig};
use crate::errors::{FhirOwlError, Result};
use crate::fhir::{self, Bundle};
use crate::ontology::{Iri, IriMappings, Ontology, OntologyLibrary};
use crate::reasoner::{Reasoner, StructuralReasoner};
use crate::report::{CodeSystemSummary, Diagnostics, TransformReport};

/// Read-only state shared by every assembler during one run
#[derive(Debug)]
pub struct TransformContext<'a> {
    pub config: &'a TransformConfig,
    pub prefixes: PrefixTable,
    pub systems: SystemMap,
    pub codes: CodeTable,
    /// IRI of the input ontology, the first of the closure
    pub root: Option<Iri>,
}

impl<'a> TransformContext<'a> {
    pub fn build<O: Ontology>(
        closure: &[O],
        config: &'a TransformConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let names: Vec<String> = closure.iter().map(|o| o.display_name()).collect();
        tracing::info!("Getting IRI -> system map for ontologies: {}", names.join(", "));

        let prefixes = PrefixTable::build(closure, diagnostics);
        let mut systems = SystemMap::build(closure, &prefixes)?;
        let codes = CodeTable::build(closure, &config.concepts);

        let root = closure.first().and_then(|o| o.iri()).cloned();
        if let (Some(root), Some(url)) = (&root, &config.code_system.url) {
            tracing::info!("Publishing {} as {}", root, url);
            systems.rename_system(root.as_str(), url);
        }

        Ok(Self {
            config,
            prefixes,
            systems,
            codes,
            root,
        })
    }

    /// Configured metadata for the code system of `ontology`, set only for
    /// the input ontology
    pub fn overrides_for(&self, ontology: &Iri) -> Option<&CodeSystemOverrides> {
        (self.root.as_ref() == Some(ontology)).then_some(&self.config.code_system)
    }
}

/// Assemble the code systems of every ontology in `closure`.
///
/// `reasoner` must already be classified over the closure. It is disposed
/// once all ontologies have been processed, including on error.
pub fn assemble_code_systems<O: Ontology>(
    closure: &[O],
    reasoner: &mut dyn Reasoner,
    config: &TransformConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<CodeSystemRecord>> {
    let result = assemble_with(closure, &*reasoner, config, diagnostics);
    reasoner.dispose();
    result
}

fn assemble_with<O: Ontology>(
    closure: &[O],
    reasoner: &dyn Reasoner,
    config: &TransformConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<CodeSystemRecord>> {
    let context = TransformContext::build(closure, config, diagnostics)?;
    let assembler = CodeSystemAssembler::new(&context, reasoner);

    let mut records = Vec::new();
    for ontology in closure {
        tracing::info!("Creating code system for ontology {}", ontology.display_name());
        match assembler.assemble(ontology, diagnostics) {
            Ok(record) => records.push(record),
            Err(FhirOwlError::MissingOntologyIri(name)) => diagnostics.warn(
                name.as_str(),
                format!("Could not create a Code System for ontology {} because it has no IRI.", name),
            ),
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}

/// Classify `closure` and package its code systems into a bundle
pub fn build_bundle<O: Ontology>(
    closure: &[O],
    config: &TransformConfig,
    diagnostics: &mut Diagnostics,
) -> Result<CodeSystemBundle> {
    if let Some(root) = closure.first() {
        tracing::info!("Classifying ontology {}", root.display_name());
    }
    let mut reasoner = StructuralReasoner::classify(closure);
    let records = assemble_code_systems(closure, &mut reasoner, config, diagnostics)?;
    Ok(BundleAssembler::new().assemble(records, diagnostics))
}

/// Transform the ontology document at `input`, and its imports, into a
/// FHIR batch bundle written to `output`.
///
/// # Example
/// ```no_run
/// # use fhir_owl::{transform, TransformConfig};
/// # async fn run() -> fhir_owl::Result<()> {
/// let report = transform("hp.owl", "hp-bundle.json", &TransformConfig::default()).await?;
/// println!("{} concepts", report.total_concepts());
/// # Ok(())
/// # }
/// ```
pub async fn transform<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &TransformConfig,
) -> Result<TransformReport> {
    let input = input.as_ref();
    let output = output.as_ref();
    config.validate()?;

    tracing::info!("Creating code systems");
    let mut diagnostics = Diagnostics::new();

    let mappings = match &config.iri_mappings {
        Some(path) => IriMappings::load(path, &mut diagnostics),
        None => IriMappings::new(),
    };

    let mut library = OntologyLibrary::new(mappings, config);
    library.load_root(input, &mut diagnostics).await?;
    let closure = library.into_closure();

    let bundle = build_bundle(&closure, config, &mut diagnostics)?;
    fhir::write_bundle(&Bundle::from(&bundle), output)?;
    tracing::info!("Done!");

    Ok(TransformReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        ontologies: closure.len(),
        code_systems: bundle
            .entries
            .iter()
            .map(|entry| CodeSystemSummary {
                id: entry.id.clone(),
                url: entry.record.url.clone(),
                name: entry.record.name.clone(),
                concept_count: entry.record.concepts.len(),
            })
            .collect(),
        diagnostics: diagnostics.into_vec(),
    })
}
