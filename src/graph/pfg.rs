// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The pointer-flow graph (PFG).
//!
//! Nodes are canonical pointers and an edge `src -> dst` means every object
//! `src` points to also flows into `dst`. Both nodes and edges only grow.

use log::*;
use petgraph::graph::{DefaultIx, EdgeIndex, NodeIndex};
use petgraph::Graph;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use super::method_pag::MethodPAG;
use crate::builder::method_pag_builder::MethodPAGBuilder;
use crate::ir::analysis_context::AnalysisContext;
use crate::ir::context::ContextId;
use crate::ir::program::{FieldId, MethodId, VarId};
use crate::pta::heap_model::CSObjId;
use crate::util::bit_vec::Idx;

// Unique identifiers for graph node and edges.
pub type PointerId = NodeIndex<DefaultIx>;
pub type PFGEdgeId = EdgeIndex<DefaultIx>;

impl Idx for PointerId {
    #[inline]
    fn new(idx: usize) -> Self {
        NodeIndex::new(idx)
    }

    #[inline]
    fn index(self) -> usize {
        NodeIndex::index(self)
    }
}

/// The four kinds of canonical pointers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pointer {
    /// A local variable under a context.
    Var(ContextId, VarId),
    StaticField(FieldId),
    /// A field of one abstract object.
    InstanceField(CSObjId, FieldId),
    /// All elements of one abstract array object, merged.
    ArrayIndex(CSObjId),
}

pub struct PFGNode {
    pointer: Pointer,
}

impl PFGNode {
    pub fn new(pointer: Pointer) -> Self {
        PFGNode { pointer }
    }

    /// Returns the pointer of the node.
    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }
}

/// How an edge came into being. Only used for reporting; all edges
/// propagate in the same way.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PFGEdgeKind {
    /// `x = y`
    LocalAssign,
    /// `C.f = x` and `o.f = x`
    Store,
    /// `x = C.f` and `x = o.f`
    Load,
    /// `a[*] = x`
    ArrayStore,
    /// `x = a[*]`
    ArrayLoad,
    /// Actual argument to formal parameter.
    ParameterPassing,
    /// Returned variable to the call result.
    Return,
}

pub struct PFGEdge {
    pub kind: PFGEdgeKind,
}

pub struct PointerFlowGraph {
    /// The graph structure capturing flow relations between pointers.
    pub(crate) graph: Graph<PFGNode, PFGEdge>,
    /// A map from pointers to node id.
    pub(crate) values: HashMap<Pointer, PointerId>,
    /// Maintains a method_pag for each method, so that in context sensitive
    /// analysis we only need to process each method body once.
    pub(crate) method_pags: HashMap<MethodId, Rc<MethodPAG>>,
}

impl Default for PointerFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerFlowGraph {
    /// Constructor
    pub fn new() -> Self {
        PointerFlowGraph {
            graph: Graph::<PFGNode, PFGEdge>::new(),
            values: HashMap::new(),
            method_pags: HashMap::new(),
        }
    }

    /// Returns a reference to the graph.
    #[inline]
    pub fn graph(&self) -> &Graph<PFGNode, PFGEdge> {
        &self.graph
    }

    /// Returns the pointer for the given node_id.
    pub fn node_pointer(&self, node_id: PointerId) -> &Pointer {
        match self.graph.node_weight(node_id) {
            Some(node) => node.pointer(),
            None => panic!("pointer {:?} has no node in the pointer-flow graph", node_id),
        }
    }

    /// Returns the node_id for the given pointer, if it has been created.
    pub fn get_node_id(&self, pointer: &Pointer) -> Option<PointerId> {
        self.values.get(pointer).copied()
    }

    /// Helper function to get a node or insert a new
    /// node if it does not exist in the map.
    pub fn get_or_insert_node(&mut self, pointer: Pointer) -> PointerId {
        match self.values.entry(pointer) {
            Entry::Occupied(o) => o.get().to_owned(),
            Entry::Vacant(v) => {
                let node_id = self.graph.add_node(PFGNode::new(pointer));
                *v.insert(node_id)
            }
        }
    }

    #[inline]
    pub fn var_pointer(&mut self, cid: ContextId, var: VarId) -> PointerId {
        self.get_or_insert_node(Pointer::Var(cid, var))
    }

    #[inline]
    pub fn static_field(&mut self, field: FieldId) -> PointerId {
        self.get_or_insert_node(Pointer::StaticField(field))
    }

    #[inline]
    pub fn instance_field(&mut self, obj: CSObjId, field: FieldId) -> PointerId {
        self.get_or_insert_node(Pointer::InstanceField(obj, field))
    }

    #[inline]
    pub fn array_index(&mut self, obj: CSObjId) -> PointerId {
        self.get_or_insert_node(Pointer::ArrayIndex(obj))
    }

    /// Returns true if the edge from `src` to `dst` exists.
    #[inline]
    pub fn contains_edge(&self, src: PointerId, dst: PointerId) -> bool {
        self.graph.find_edge(src, dst).is_some()
    }

    /// Adds an edge from `src` to `dst`.
    /// Returns false if an edge between the two pointers already existed.
    pub fn add_edge(&mut self, src: PointerId, dst: PointerId, kind: PFGEdgeKind) -> bool {
        if self.contains_edge(src, dst) {
            return false;
        }
        self.graph.add_edge(src, dst, PFGEdge { kind });
        true
    }

    /// Iterates over the successors of `pointer`.
    pub fn successors(&self, pointer: PointerId) -> impl Iterator<Item = PointerId> + '_ {
        self.graph.neighbors(pointer)
    }

    pub fn num_pointers(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Builds the summary of `method` if it has not been built yet.
    /// Returns false for abstract methods, which have no body to summarize.
    pub fn build_method_pag(&mut self, acx: &AnalysisContext, method: MethodId) -> bool {
        if acx.program.method(method).is_abstract {
            warn!("Abstract method {} has no body", acx.method_name(method));
            return false;
        }
        if let Entry::Vacant(v) = self.method_pags.entry(method) {
            let mut mpag = MethodPAG::new(method);
            MethodPAGBuilder::new(acx, method, &mut mpag).build();
            v.insert(Rc::new(mpag));
        }
        true
    }

    pub fn get_method_pag(&self, method: &MethodId) -> Option<Rc<MethodPAG>> {
        self.method_pags.get(method).cloned()
    }
}
