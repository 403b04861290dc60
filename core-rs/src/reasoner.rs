//! Classification
//!
//! The pipeline only needs two questions answered per class: its direct
//! super-classes and its equivalent classes. [`Reasoner`] is that contract.
//! [`StructuralReasoner`] answers it from told axioms across the whole import
//! closure; it does not perform description-logic inference.

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::ontology::vocab::{BuiltInClass, OWL_NOTHING, OWL_THING};
use crate::ontology::{Iri, Ontology};

static THING: Lazy<Iri> = Lazy::new(|| Iri::from(BuiltInClass::Thing));

pub trait Reasoner {
    /// Direct named super-classes of `class`, sorted
    fn direct_superclasses(&self, class: &Iri) -> Vec<Iri>;

    /// Named classes equivalent to `class` (excluding itself), sorted
    fn equivalent_classes(&self, class: &Iri) -> Vec<Iri>;

    /// Release the classification. Called once per run after every
    /// ontology has been processed.
    fn dispose(&mut self) {}
}

/// Told-axiom classifier over an import closure
#[derive(Debug, Default)]
pub struct StructuralReasoner {
    direct: HashMap<Iri, Vec<Iri>>,
    equivalents: HashMap<Iri, BTreeSet<Iri>>,
    disposed: bool,
}

impl StructuralReasoner {
    /// Precompute the class hierarchy for every class in `closure`.
    ///
    /// Classes on a cycle of told sub-class and equivalence axioms collapse
    /// into one equivalence group. Told super-classes are shared across the
    /// group and reduced transitively; a class with no remaining named
    /// parent sits directly under `owl:Thing`.
    pub fn classify<O: Ontology>(closure: &[O]) -> Self {
        let mut classes: BTreeSet<Iri> = BTreeSet::new();
        let mut graph = ClassGraph::default();

        for ontology in closure {
            classes.extend(ontology.classes().into_iter().cloned());
            for (a, b) in ontology.equivalence_axioms() {
                graph.add_edge(a, b);
                graph.add_edge(b, a);
            }
            for (sub, sup) in ontology.subclass_axioms() {
                graph.add_edge(sub, sup);
            }
        }

        let equivalents = graph.equivalence_groups();
        let group_of = |class: &Iri| -> BTreeSet<Iri> {
            let mut group = equivalents.get(class).cloned().unwrap_or_default();
            group.insert(class.clone());
            group
        };

        // Told parents of a class, pooled over its equivalence group
        let mut asserted: HashMap<Iri, BTreeSet<Iri>> = HashMap::new();
        for class in graph.nodes.iter().chain(classes.iter()) {
            if asserted.contains_key(class) {
                continue;
            }
            let group = group_of(class);
            let parents: BTreeSet<Iri> = group
                .iter()
                .flat_map(|member| graph.successors(member))
                .filter(|parent| !group.contains(*parent))
                .cloned()
                .collect();
            asserted.insert(class.clone(), parents);
        }

        let mut direct = HashMap::new();
        for class in &classes {
            if group_of(class).contains(&*THING) {
                direct.insert(class.clone(), Vec::new());
                continue;
            }

            let parents = &asserted[class];
            let ancestors: HashMap<&Iri, HashSet<Iri>> = parents
                .iter()
                .map(|p| (p, ancestors_of(p, &asserted, &equivalents)))
                .collect();

            // Drop a parent reachable through another parent
            let mut reduced: Vec<Iri> = parents
                .iter()
                .filter(|p| !parents.iter().any(|q| q != *p && ancestors[q].contains(*p)))
                .filter(|p| p.as_str() != OWL_THING)
                .cloned()
                .collect();

            if reduced.is_empty() && class.as_str() != OWL_NOTHING {
                reduced.push(THING.clone());
            }
            direct.insert(class.clone(), reduced);
        }

        tracing::debug!("Classified {} classes", classes.len());

        Self {
            direct,
            equivalents,
            disposed: false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Reasoner for StructuralReasoner {
    fn direct_superclasses(&self, class: &Iri) -> Vec<Iri> {
        if self.disposed {
            return Vec::new();
        }
        match self.direct.get(class) {
            Some(parents) => parents.clone(),
            None if class.as_str() == OWL_THING => Vec::new(),
            None => vec![THING.clone()],
        }
    }

    fn equivalent_classes(&self, class: &Iri) -> Vec<Iri> {
        if self.disposed {
            return Vec::new();
        }
        self.equivalents
            .get(class)
            .map(|group| group.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn dispose(&mut self) {
        self.direct.clear();
        self.equivalents.clear();
        self.disposed = true;
    }
}

/// Told axioms as a directed graph, sub-class to super-class, with
/// equivalences as edges in both directions.
#[derive(Debug, Default)]
struct ClassGraph {
    nodes: Vec<Iri>,
    index: HashMap<Iri, usize>,
    edges: Vec<BTreeSet<usize>>,
}

impl ClassGraph {
    fn node(&mut self, class: &Iri) -> usize {
        if let Some(&idx) = self.index.get(class) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(class.clone());
        self.index.insert(class.clone(), idx);
        self.edges.push(BTreeSet::new());
        idx
    }

    fn add_edge(&mut self, from: &Iri, to: &Iri) {
        if from == to {
            return;
        }
        let from = self.node(from);
        let to = self.node(to);
        self.edges[from].insert(to);
    }

    fn successors<'g>(&'g self, class: &Iri) -> impl Iterator<Item = &'g Iri> + 'g {
        self.index
            .get(class)
            .into_iter()
            .flat_map(move |&idx| self.edges[idx].iter().map(move |&next| &self.nodes[next]))
    }

    /// Strongly connected components (Kosaraju), each member of a
    /// multi-class component mapped to the rest of it.
    fn equivalence_groups(&self) -> HashMap<Iri, BTreeSet<Iri>> {
        let n = self.nodes.len();

        let mut order = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut stack: Vec<(usize, Vec<usize>)> =
                vec![(start, self.edges[start].iter().copied().collect())];
            while let Some((node, pending)) = stack.last_mut() {
                let node = *node;
                match pending.pop() {
                    Some(next) if !visited[next] => {
                        visited[next] = true;
                        stack.push((next, self.edges[next].iter().copied().collect()));
                    }
                    Some(_) => {}
                    None => {
                        order.push(node);
                        stack.pop();
                    }
                }
            }
        }

        let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (from, targets) in self.edges.iter().enumerate() {
            for &to in targets {
                reverse[to].push(from);
            }
        }

        let mut component: Vec<Option<usize>> = vec![None; n];
        let mut members: Vec<Vec<usize>> = Vec::new();
        for &start in order.iter().rev() {
            if component[start].is_some() {
                continue;
            }
            let id = members.len();
            component[start] = Some(id);
            let mut found = vec![start];
            let mut stack = vec![start];
            while let Some(node) = stack.pop() {
                for &prev in &reverse[node] {
                    if component[prev].is_none() {
                        component[prev] = Some(id);
                        found.push(prev);
                        stack.push(prev);
                    }
                }
            }
            members.push(found);
        }

        let mut groups = HashMap::new();
        for found in members.into_iter().filter(|m| m.len() > 1) {
            let group: BTreeSet<Iri> = found.iter().map(|&idx| self.nodes[idx].clone()).collect();
            for member in &group {
                let mut others = group.clone();
                others.remove(member);
                groups.insert(member.clone(), others);
            }
        }
        groups
    }
}

/// Every class above `class`, including the equivalents of each ancestor
fn ancestors_of(
    class: &Iri,
    asserted: &HashMap<Iri, BTreeSet<Iri>>,
    equivalents: &HashMap<Iri, BTreeSet<Iri>>,
) -> HashSet<Iri> {
    let mut seen = HashSet::new();
    let mut stack: Vec<&Iri> = asserted.get(class).into_iter().flatten().collect();
    while let Some(next) = stack.pop() {
        if seen.insert(next.clone()) {
            seen.extend(equivalents.get(next).into_iter().flatten().cloned());
            stack.extend(asserted.get(next).into_iter().flatten());
        }
    }
    seen
}
