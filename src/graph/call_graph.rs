// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DefaultIx, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Graph;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::ir::analysis_context::AnalysisContext;
use crate::ir::call_site::{CSCallSite, CallKind, CallSite};
use crate::ir::method::CSMethodId;
use crate::ir::program::{MethodId, Program};

/// Unique identifiers for call graph nodes.
pub type CGNodeId = NodeIndex<DefaultIx>;
/// Unique identifiers for call graph edges.
pub type CGEdgeId = EdgeIndex<DefaultIx>;
/// Context-sensitive call graph.
pub type CSCallGraph = CallGraph<CSMethodId, CSCallSite>;
/// Context-insensitive call graph.
pub type CICallGraph = CallGraph<MethodId, CallSite>;

pub trait CGMethod: Copy + Clone + PartialEq + Eq + Hash + Debug + Ord {
    fn method_id(&self) -> MethodId;
    fn dot_label(&self, acx: &AnalysisContext) -> String;
}

impl CGMethod for MethodId {
    fn method_id(&self) -> MethodId {
        *self
    }

    fn dot_label(&self, acx: &AnalysisContext) -> String {
        acx.method_name(*self)
    }
}

impl CGMethod for CSMethodId {
    fn method_id(&self) -> MethodId {
        self.method
    }

    fn dot_label(&self, acx: &AnalysisContext) -> String {
        format!("{} {:?}", acx.method_name(self.method), self.cid)
    }
}

pub trait CGCallSite: Copy + Clone + PartialEq + Eq + Hash + Debug + Ord {
    fn callsite(&self) -> CallSite;
}

impl CGCallSite for CallSite {
    fn callsite(&self) -> CallSite {
        *self
    }
}

impl CGCallSite for CSCallSite {
    fn callsite(&self) -> CallSite {
        self.callsite
    }
}

#[derive(Debug)]
pub struct CallGraphNode<F: CGMethod> {
    pub(crate) method: F,
}

impl<F: CGMethod> CallGraphNode<F> {
    pub fn new(method: F) -> Self {
        CallGraphNode { method }
    }
}

#[derive(Debug)]
pub struct CallGraphEdge<S: CGCallSite> {
    pub(crate) callsite: S,
    pub(crate) kind: CallKind,
}

impl<S: CGCallSite> CallGraphEdge<S> {
    pub fn new(callsite: S, kind: CallKind) -> Self {
        CallGraphEdge { callsite, kind }
    }
}

pub struct CallGraph<F: CGMethod, S: CGCallSite> {
    /// The graph structure capturing call relationships.
    pub graph: Graph<CallGraphNode<F>, CallGraphEdge<S>>,
    /// A map from methods to their corresponding call graph nodes.
    pub method_nodes: HashMap<F, CGNodeId>,
    /// A map from call sites to call graph edges.
    pub callsite_to_edges: HashMap<S, Vec<CGEdgeId>>,
    pub(crate) entry_methods: Vec<F>,
    /// Reachable methods in the order they were discovered.
    pub(crate) reach_methods: Vec<F>,
    reach_set: HashSet<F>,
}

impl<F: CGMethod, S: CGCallSite> Default for CallGraph<F, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: CGMethod, S: CGCallSite> CallGraph<F, S> {
    pub fn new() -> Self {
        CallGraph {
            graph: Graph::<CallGraphNode<F>, CallGraphEdge<S>>::new(),
            method_nodes: HashMap::new(),
            callsite_to_edges: HashMap::new(),
            entry_methods: Vec::new(),
            reach_methods: Vec::new(),
            reach_set: HashSet::new(),
        }
    }

    pub fn add_entry_method(&mut self, method: F) {
        if !self.entry_methods.contains(&method) {
            self.entry_methods.push(method);
        }
    }

    pub fn entry_methods(&self) -> &[F] {
        &self.entry_methods
    }

    /// Marks `method` reachable. Returns false if it already was.
    pub fn add_reachable_method(&mut self, method: F) -> bool {
        if !self.reach_set.insert(method) {
            return false;
        }
        self.get_or_insert_node(method);
        self.reach_methods.push(method);
        true
    }

    #[inline]
    pub fn is_reachable(&self, method: &F) -> bool {
        self.reach_set.contains(method)
    }

    /// Reachable methods in the order they were discovered.
    pub fn reachable_methods(&self) -> &[F] {
        &self.reach_methods
    }

    /// Helper function to get a node or insert a new
    /// node if it does not exist in the map.
    fn get_or_insert_node(&mut self, method: F) -> CGNodeId {
        match self.method_nodes.entry(method) {
            Entry::Occupied(o) => o.get().to_owned(),
            Entry::Vacant(v) => {
                let node_id = self.graph.add_node(CallGraphNode::new(method));
                *v.insert(node_id)
            }
        }
    }

    /// Returns the methods called at `callsite`.
    pub fn get_callees(&self, callsite: &S) -> Vec<F> {
        match self.callsite_to_edges.get(callsite) {
            Some(edges) => edges
                .iter()
                .filter_map(|edge_id| self.graph.edge_endpoints(*edge_id))
                .map(|(_, target)| self.graph[target].method)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Returns the call sites in `caller` that have at least one resolved callee.
    pub fn callsites_in(&self, caller: F) -> Vec<S> {
        let mut callsites = match self.method_nodes.get(&caller) {
            Some(node) => self
                .graph
                .edges(*node)
                .map(|e| e.weight().callsite)
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };
        callsites.sort();
        callsites.dedup();
        callsites
    }

    /// Returns true if an edge to the callee already existed for the callsite.
    pub fn has_edge(&self, callsite: &S, callee: F) -> bool {
        self.get_callees(callsite).contains(&callee)
    }

    /// Adds a new edge to the call graph.
    /// The edge is a call from `caller` to `callee` at `callsite`.
    /// Returns false if the edge already existed, and true otherwise.
    pub fn add_edge(&mut self, callsite: S, caller: F, callee: F, kind: CallKind) -> bool {
        if self.has_edge(&callsite, callee) {
            return false;
        }
        let caller_node = self.get_or_insert_node(caller);
        let callee_node = self.get_or_insert_node(callee);
        let edge_id = self
            .graph
            .add_edge(caller_node, callee_node, CallGraphEdge::new(callsite, kind));
        self.callsite_to_edges.entry(callsite).or_default().push(edge_id);
        true
    }

    /// Iterates over all edges as `(callsite, caller, callee, kind)`.
    pub fn edges(&self) -> impl Iterator<Item = (S, F, F, CallKind)> + '_ {
        self.graph.edge_references().map(move |e| {
            let weight = e.weight();
            (
                weight.callsite,
                self.graph[e.source()].method,
                self.graph[e.target()].method,
                weight.kind,
            )
        })
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Merges contexts away, keeping one node per method and one edge per
    /// (call site, callee) pair.
    pub fn project(&self) -> CICallGraph {
        let mut ci = CICallGraph::new();
        for entry in &self.entry_methods {
            ci.add_entry_method(entry.method_id());
        }
        for method in &self.reach_methods {
            ci.add_reachable_method(method.method_id());
        }
        for (callsite, caller, callee, kind) in self.edges() {
            ci.add_edge(callsite.callsite(), caller.method_id(), callee.method_id(), kind);
        }
        ci
    }

    /// Produce a dot representation of the call graph
    /// for displaying with Graphviz.
    pub fn to_dot(&self, acx: &AnalysisContext) -> String {
        let node_attrs = |_: &Graph<CallGraphNode<F>, CallGraphEdge<S>>, (_, node): (CGNodeId, &CallGraphNode<F>)| {
            format!("label = {:?}", node.method.dot_label(acx))
        };
        let edge_attrs = |_: &Graph<CallGraphNode<F>, CallGraphEdge<S>>, edge: petgraph::graph::EdgeReference<'_, CallGraphEdge<S>>| {
            let callsite = edge.weight().callsite.callsite();
            format!("label = \"{}:{:?}\"", callsite.stmt_index, edge.weight().kind)
        };
        format!(
            "{:?}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::NodeNoLabel, Config::EdgeNoLabel],
                &edge_attrs,
                &node_attrs
            )
        )
    }
}

impl CICallGraph {
    /// Non-abstract methods of `program` that are not reachable.
    pub fn dead_methods(&self, program: &Program) -> Vec<MethodId> {
        program
            .methods
            .iter_enumerated()
            .filter(|(id, method)| !method.is_abstract && !self.is_reachable(id))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn m(i: usize) -> MethodId {
        MethodId::from_usize(i)
    }

    #[test]
    fn edges_are_added_once() {
        let mut cg = CICallGraph::new();
        let cs = CallSite::new(m(0), 3);
        assert!(cg.add_reachable_method(m(0)));
        assert!(!cg.add_reachable_method(m(0)));
        assert!(cg.add_edge(cs, m(0), m(1), CallKind::Virtual));
        assert!(!cg.add_edge(cs, m(0), m(1), CallKind::Virtual));
        assert!(cg.add_edge(cs, m(0), m(2), CallKind::Virtual));
        assert_eq!(cg.num_edges(), 2);
        assert_eq!(cg.get_callees(&cs), vec![m(1), m(2)]);
        // Adding an edge does not make the callee reachable by itself.
        assert!(!cg.is_reachable(&m(1)));
        assert_eq!(cg.callsites_in(m(0)), vec![cs]);
    }
}
