//! Concept assembly: one OWL class to one code system concept

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

use crate::config::{CodeReplace, ConceptOptions};
use crate::ontology::vocab::{
    BuiltInClass, DEPRECATED_SHORT_FORM, EXACT_SYNONYM_SHORT_FORM, OWL_NOTHING, OWL_THING,
    RDFS_LABEL,
};
use crate::ontology::{Iri, Ontology};
use crate::reasoner::Reasoner;
use crate::report::Diagnostics;
use crate::transform::annotations::AnnotationIndex;
use crate::transform::system::SystemMap;

static DEFAULT_OPTIONS: Lazy<ConceptOptions> = Lazy::new(ConceptOptions::default);
static SHORT_FORM_CODES: Lazy<CodeTable> = Lazy::new(CodeTable::default);

/// Parent reference, ordered by system then code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParentRef {
    pub system: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRecord {
    pub code: String,
    pub display: String,
    pub definition: Option<String>,
    /// Alternative labels, never containing `display`
    pub synonyms: BTreeSet<String>,
    pub parents: Vec<ParentRef>,
    pub root: bool,
    pub deprecated: bool,
}

/// Concept code of every class in the closure.
///
/// A class takes the first value of the configured code property found in
/// closure order, else its short form. The code replacement applies to
/// every code, including those used in parent references.
#[derive(Debug, Default)]
pub struct CodeTable {
    annotated: HashMap<Iri, String>,
    replace: Option<CodeReplace>,
}

impl CodeTable {
    pub fn build<O: Ontology>(closure: &[O], options: &ConceptOptions) -> Self {
        let mut annotated = HashMap::new();

        if let Some(property) = &options.code_property {
            for ontology in closure {
                for class in ontology.classes() {
                    if annotated.contains_key(class) {
                        continue;
                    }
                    if let Some(code) = AnnotationIndex::for_class(ontology, class).first(property) {
                        annotated.insert(class.clone(), code.to_string());
                    }
                }
            }
            tracing::debug!("Found {} codes in {}", annotated.len(), property);
        }

        Self {
            annotated,
            replace: options.code_replace.clone(),
        }
    }

    pub fn code(&self, class: &Iri) -> String {
        let code = self
            .annotated
            .get(class)
            .map(String::as_str)
            .unwrap_or_else(|| class.short_form());
        match &self.replace {
            Some(replace) => replace.apply(code),
            None => code.to_string(),
        }
    }
}

pub struct ConceptAssembler<'a> {
    reasoner: &'a dyn Reasoner,
    systems: &'a SystemMap,
    codes: &'a CodeTable,
    options: &'a ConceptOptions,
}

impl<'a> ConceptAssembler<'a> {
    /// Assembler with the default options: short-form codes, `rdfs:label`
    /// displays and `hasExactSynonym` synonyms
    pub fn new(reasoner: &'a dyn Reasoner, systems: &'a SystemMap) -> Self {
        Self {
            reasoner,
            systems,
            codes: &SHORT_FORM_CODES,
            options: &DEFAULT_OPTIONS,
        }
    }

    pub fn with_options(mut self, options: &'a ConceptOptions, codes: &'a CodeTable) -> Self {
        self.options = options;
        self.codes = codes;
        self
    }

    /// Build the concept for `class` using the annotations `ontology` holds
    /// about it.
    pub fn assemble<O: Ontology + ?Sized>(
        &self,
        ontology: &O,
        class: &Iri,
        diagnostics: &mut Diagnostics,
    ) -> ConceptRecord {
        let code = self.codes.code(class);
        let deprecated = is_deprecated(ontology, class, diagnostics);
        let parents = self.parents(class);
        // Every class is equivalent to itself
        let root = class.as_str() == OWL_THING
            || self
                .reasoner
                .equivalent_classes(class)
                .iter()
                .any(|eq| eq.as_str() == OWL_THING);

        let index = AnnotationIndex::for_class(ontology, class);
        let (preferred, mut synonyms) = self.labels(ontology, class, &index);
        let display = if class.as_str() == OWL_THING {
            synonyms.extend(preferred);
            BuiltInClass::Thing.label().to_string()
        } else {
            preferred.unwrap_or_else(|| code.clone())
        };
        synonyms.remove(&display);

        let definition = self
            .options
            .definition_property
            .as_deref()
            .and_then(|property| index.first(property))
            .map(str::to_string);

        ConceptRecord {
            code,
            display,
            definition,
            synonyms,
            parents,
            root,
            deprecated,
        }
    }

    /// Whether a concept with these flags belongs in its code system
    pub fn includes(&self, record: &ConceptRecord) -> bool {
        self.options.include_deprecated || !record.deprecated
    }

    fn parents(&self, class: &Iri) -> Vec<ParentRef> {
        let superclasses = self.reasoner.direct_superclasses(class);
        tracing::debug!("Found {} parents for concept {}", superclasses.len(), class);

        let parents: BTreeSet<ParentRef> = superclasses
            .iter()
            .filter(|parent| parent.as_str() != OWL_NOTHING)
            .filter_map(|parent| {
                let system = self.systems.get(parent)?;
                Some(ParentRef {
                    system: system.to_string(),
                    code: self.codes.code(parent),
                })
            })
            .collect();

        parents.into_iter().collect()
    }

    /// Preferred term and the remaining label candidates.
    ///
    /// The first value of the display property is preferred. Without one,
    /// the smallest synonym takes its place. Excluded labels are never
    /// candidates.
    fn labels<O: Ontology + ?Sized>(
        &self,
        ontology: &O,
        class: &Iri,
        index: &AnnotationIndex,
    ) -> (Option<String>, BTreeSet<String>) {
        let excluded = |label: &String| self.options.labels_to_exclude.contains(label);
        let display_property = self.options.display_property.as_deref().unwrap_or(RDFS_LABEL);

        let displays: Vec<&String> = index
            .values(display_property)
            .iter()
            .filter(|label| !excluded(*label))
            .collect();

        let synonyms: Vec<String> = match &self.options.synonym_properties {
            Some(properties) => properties
                .iter()
                .flat_map(|property| index.values(property).iter().cloned())
                .collect(),
            None => ontology
                .class_annotations(class)
                .iter()
                .filter(|a| a.property.short_form() == EXACT_SYNONYM_SHORT_FORM)
                .filter_map(|a| a.value.as_literal())
                .map(|literal| literal.lexical.clone())
                .collect(),
        };

        let mut candidates: BTreeSet<String> = displays.iter().map(|label| (*label).clone()).collect();
        candidates.extend(synonyms.into_iter().filter(|label| !excluded(label)));

        let preferred = displays
            .first()
            .map(|label| (*label).clone())
            .or_else(|| candidates.iter().next().cloned());
        if let Some(preferred) = &preferred {
            candidates.remove(preferred);
        }

        (preferred, candidates)
    }
}

/// A class is deprecated when any `deprecated` annotation carries a true
/// boolean, whatever order the annotations were read in.
fn is_deprecated<O: Ontology + ?Sized>(
    ontology: &O,
    class: &Iri,
    diagnostics: &mut Diagnostics,
) -> bool {
    let mut deprecated = false;

    for annotation in ontology.class_annotations(class) {
        if annotation.property.short_form() != DEPRECATED_SHORT_FORM {
            continue;
        }
        let Some(literal) = annotation.value.as_literal() else {
            continue;
        };
        match literal.as_boolean() {
            Some(value) => deprecated |= value,
            None => diagnostics.warn(
                class.as_str(),
                format!("Found deprecated attribute but it is not boolean: {}", literal),
            ),
        }
    }

    deprecated
}
