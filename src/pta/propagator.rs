// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Propagating points-to information along the pointer-flow graph edges.

use std::collections::VecDeque;

use super::{PTDataTy, PointsTo};
use crate::graph::pfg::{PFGEdgeKind, PointerFlowGraph, PointerId};
use crate::ir::method::CSMethodId;
use crate::pts_set::points_to::PointsToSet;

/// A unit of pending work for the solver.
#[derive(Debug)]
pub enum WorkItem {
    /// A method that may have become reachable under a context.
    NewMethod(CSMethodId),
    /// Objects that should flow into a pointer.
    NewPointsTo(PointerId, PointsTo),
}

/// FIFO worklist of the solver.
#[derive(Debug, Default)]
pub struct WorkList {
    items: VecDeque<WorkItem>,
}

impl WorkList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push_method(&mut self, method: CSMethodId) {
        self.items.push_back(WorkItem::NewMethod(method));
    }

    #[inline]
    pub fn push_points_to(&mut self, pointer: PointerId, pts: PointsTo) {
        self.items.push_back(WorkItem::NewPointsTo(pointer, pts));
    }

    #[inline]
    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Borrows the pieces of solver state touched when objects flow along edges.
pub struct Propagator<'a> {
    pt_data: &'a mut PTDataTy,
    pfg: &'a mut PointerFlowGraph,
    worklist: &'a mut WorkList,
}

impl<'a> Propagator<'a> {
    pub fn new(pt_data: &'a mut PTDataTy, pfg: &'a mut PointerFlowGraph, worklist: &'a mut WorkList) -> Self {
        Propagator { pt_data, pfg, worklist }
    }

    /// Merges `pts` into the points-to set of `pointer` and forwards the
    /// new objects to every successor. Returns the new objects.
    pub fn propagate(&mut self, pointer: PointerId, pts: &PointsTo) -> PointsTo {
        let delta = self.pt_data.propagate(pointer, pts);
        if !delta.is_empty() {
            for succ in self.pfg.successors(pointer) {
                self.worklist.push_points_to(succ, delta.clone());
            }
        }
        delta
    }

    /// Adds the edge `src -> dst`. A new edge from a pointer that already
    /// points to something immediately forwards those objects.
    pub fn add_edge(&mut self, src: PointerId, dst: PointerId, kind: PFGEdgeKind) -> bool {
        if !self.pfg.add_edge(src, dst, kind) {
            return false;
        }
        if let Some(pts) = self.pt_data.get_pts(src) {
            if !pts.is_empty() {
                self.worklist.push_points_to(dst, pts.clone());
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::context::ContextId;
    use crate::ir::program::VarId;
    use crate::pta::heap_model::CSObjId;
    use crate::pts_set::points_to::HybridPointsToSet;

    #[test]
    fn late_edges_forward_existing_objects() {
        let mut pt_data = PTDataTy::new();
        let mut pfg = PointerFlowGraph::new();
        let mut worklist = WorkList::new();
        let cid = ContextId::from_usize(0);
        let x = pfg.var_pointer(cid, VarId::from_usize(0));
        let y = pfg.var_pointer(cid, VarId::from_usize(1));
        let o = CSObjId::from_usize(7);

        let mut propagator = Propagator::new(&mut pt_data, &mut pfg, &mut worklist);
        let delta = propagator.propagate(x, &HybridPointsToSet::singleton(o));
        assert_eq!(delta.iter().collect::<Vec<_>>(), vec![o]);
        assert!(propagator.propagate(x, &HybridPointsToSet::singleton(o)).is_empty());
        assert!(propagator.add_edge(x, y, PFGEdgeKind::LocalAssign));
        assert!(!propagator.add_edge(x, y, PFGEdgeKind::LocalAssign));

        assert_eq!(worklist.len(), 1);
        match worklist.pop() {
            Some(WorkItem::NewPointsTo(p, pts)) => {
                assert_eq!(p, y);
                assert!(pts.contains(o));
            }
            other => panic!("unexpected work item {:?}", other),
        }
    }
}
