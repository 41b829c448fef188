// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt::{Debug, Formatter, Result};
use std::time::Instant;

use log::*;

use super::context_strategy::{ContextStrategy, KCallSiteSensitive, KObjectSensitive, KTypeSensitive};
use super::heap_model::{CSObjCache, CSObjId, HeapModel};
use super::propagator::{Propagator, WorkItem, WorkList};
use super::result::PointerAnalysisResult;
use super::{PTDataTy, PointerAnalysis, PointsTo};
use crate::builder::call_graph_builder;
use crate::graph::call_graph::CSCallGraph;
use crate::graph::pfg::{PFGEdgeKind, Pointer, PointerFlowGraph, PointerId};
use crate::ir::analysis_context::AnalysisContext;
use crate::ir::call_site::{CSCallSite, CallSite};
use crate::ir::context::ContextId;
use crate::ir::method::CSMethodId;
use crate::ir::program::VarId;
use crate::ir::stmt::InvokeExp;
use crate::pts_set::points_to::{HybridPointsToSet, PointsToSet};

pub type CallSiteSensitivePTA<'pta> = ContextSensitivePTA<'pta, KCallSiteSensitive>;
pub type ObjectSensitivePTA<'pta> = ContextSensitivePTA<'pta, KObjectSensitive>;
pub type TypeSensitivePTA<'pta> = ContextSensitivePTA<'pta, KTypeSensitive>;

/// Andersen-style inclusion-based pointer analysis with on-the-fly call
/// graph construction, parameterized by a context strategy.
pub struct ContextSensitivePTA<'pta, S: ContextStrategy> {
    /// The analysis context
    pub(crate) acx: &'pta AnalysisContext,
    /// Points-to data
    pub(crate) pt_data: PTDataTy,
    /// Pointer-flow graph
    pub(crate) pfg: PointerFlowGraph,
    /// Call graph
    pub call_graph: CSCallGraph,

    pub(crate) heap_model: HeapModel,
    pub(crate) cs_objs: CSObjCache,

    worklist: WorkList,
    /// Number of work items taken from the worklist.
    pub(crate) num_iterations: usize,

    ctx_strategy: S,
}

impl<'pta, S: ContextStrategy> Debug for ContextSensitivePTA<'pta, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        "ContextSensitivePTA".fmt(f)
    }
}

/// Constructor
impl<'pta, S: ContextStrategy> ContextSensitivePTA<'pta, S> {
    pub fn new(acx: &'pta AnalysisContext, ctx_strategy: S) -> Self {
        ContextSensitivePTA {
            acx,
            pt_data: PTDataTy::new(),
            pfg: PointerFlowGraph::new(),
            call_graph: CSCallGraph::new(),
            heap_model: HeapModel::new(acx.analysis_options.heap_model),
            cs_objs: CSObjCache::new(),
            worklist: WorkList::new(),
            num_iterations: 0,
            ctx_strategy,
        }
    }

    #[inline]
    pub fn get_empty_context_id(&mut self) -> ContextId {
        self.ctx_strategy.get_empty_context_id()
    }

    #[inline]
    pub fn get_pt_data(&self) -> &PTDataTy {
        &self.pt_data
    }

    #[inline]
    pub fn get_pfg(&self) -> &PointerFlowGraph {
        &self.pfg
    }

    #[inline]
    pub fn num_contexts(&self) -> usize {
        self.ctx_strategy.num_contexts()
    }

    /// Initialize the analysis.
    pub fn initialize(&mut self) {
        let empty_cid = self.get_empty_context_id();
        let entry = CSMethodId::new(empty_cid, self.acx.entry_point);
        self.call_graph.add_entry_method(entry);
        self.worklist.push_method(entry);
    }

    /// Drains the worklist until a fixed point is reached.
    pub fn propagate(&mut self) {
        while self.step() {}
    }

    /// Processes one work item. Returns false once the worklist is empty.
    pub fn step(&mut self) -> bool {
        let item = match self.worklist.pop() {
            Some(item) => item,
            None => return false,
        };
        self.num_iterations += 1;
        match item {
            WorkItem::NewMethod(method) => self.add_reach_method(method),
            WorkItem::NewPointsTo(pointer, pts) => {
                let delta = self.propagator().propagate(pointer, &pts);
                if !delta.is_empty() {
                    if let Pointer::Var(cid, var) = *self.pfg.node_pointer(pointer) {
                        self.process_var_delta(cid, var, &delta);
                    }
                }
            }
        }
        true
    }

    #[inline]
    fn propagator(&mut self) -> Propagator<'_> {
        Propagator::new(&mut self.pt_data, &mut self.pfg, &mut self.worklist)
    }

    #[inline]
    fn add_pfg_edge(&mut self, src: PointerId, dst: PointerId, kind: PFGEdgeKind) {
        self.propagator().add_edge(src, dst, kind);
    }

    /// Processes the statements of a method that has become reachable.
    /// Statements depending on the objects pointed to by a variable are
    /// deferred until that variable's points-to set grows.
    fn add_reach_method(&mut self, method: CSMethodId) {
        if !self.call_graph.add_reachable_method(method) {
            return;
        }
        debug!(
            "Processing method {}, context: {:?}",
            self.acx.method_name(method.method),
            self.ctx_strategy.get_context_by_id(method.cid),
        );
        if !self.pfg.build_method_pag(self.acx, method.method) {
            return;
        }
        let mpag = match self.pfg.get_method_pag(&method.method) {
            Some(mpag) => mpag,
            None => return,
        };
        let cid = method.cid;

        for (lhs, site) in &mpag.allocations {
            let obj = self.heap_model.get_obj(&self.acx.program, *site);
            let heap_cid = self.ctx_strategy.new_heap_context(cid, obj);
            let cs_obj = self.cs_objs.get_cs_obj_id(heap_cid, obj);
            let lhs = self.pfg.var_pointer(cid, *lhs);
            self.worklist.push_points_to(lhs, HybridPointsToSet::singleton(cs_obj));
        }
        for (src, dst) in &mpag.copies {
            let src = self.pfg.var_pointer(cid, *src);
            let dst = self.pfg.var_pointer(cid, *dst);
            self.add_pfg_edge(src, dst, PFGEdgeKind::LocalAssign);
        }
        for (field, lhs) in &mpag.static_loads {
            let src = self.pfg.static_field(*field);
            let dst = self.pfg.var_pointer(cid, *lhs);
            self.add_pfg_edge(src, dst, PFGEdgeKind::Load);
        }
        for (rhs, field) in &mpag.static_stores {
            let src = self.pfg.var_pointer(cid, *rhs);
            let dst = self.pfg.static_field(*field);
            self.add_pfg_edge(src, dst, PFGEdgeKind::Store);
        }
        for callsite in &mpag.static_callsites {
            self.process_static_call(cid, *callsite);
        }
    }

    fn process_static_call(&mut self, cid: ContextId, callsite: CallSite) {
        let acx = self.acx;
        let invoke = call_graph_builder::invoke_at(acx, callsite);
        let callee = match call_graph_builder::resolve_callee(acx, None, invoke) {
            Some(callee) => callee,
            None => {
                warn!(
                    "Unable to resolve {:?} call to {} in {}",
                    invoke.kind,
                    acx.program.method_ref_name(&invoke.method_ref),
                    acx.method_name(callsite.method)
                );
                return;
            }
        };
        let callee_cid = self.ctx_strategy.new_static_call_context(cid, callsite, callee);
        self.add_call_edge(CSCallSite::new(cid, callsite), CSMethodId::new(callee_cid, callee), invoke);
    }

    /// Replays the statements based on `var` for the newly pointed-to objects.
    fn process_var_delta(&mut self, cid: ContextId, var: VarId, delta: &PointsTo) {
        let method = self.acx.program.var(var).method;
        // `var` may receive objects before its method is processed.
        if !self.pfg.build_method_pag(self.acx, method) {
            return;
        }
        let mpag = match self.pfg.get_method_pag(&method) {
            Some(mpag) => mpag,
            None => return,
        };
        let accesses = match mpag.accesses_of(var) {
            Some(accesses) => accesses,
            None => return,
        };
        for cs_obj in delta.iter() {
            for (field, rhs) in &accesses.store_fields {
                let src = self.pfg.var_pointer(cid, *rhs);
                let dst = self.pfg.instance_field(cs_obj, *field);
                self.add_pfg_edge(src, dst, PFGEdgeKind::Store);
            }
            for (field, lhs) in &accesses.load_fields {
                let src = self.pfg.instance_field(cs_obj, *field);
                let dst = self.pfg.var_pointer(cid, *lhs);
                self.add_pfg_edge(src, dst, PFGEdgeKind::Load);
            }
            for rhs in &accesses.store_arrays {
                let src = self.pfg.var_pointer(cid, *rhs);
                let dst = self.pfg.array_index(cs_obj);
                self.add_pfg_edge(src, dst, PFGEdgeKind::ArrayStore);
            }
            for lhs in &accesses.load_arrays {
                let src = self.pfg.array_index(cs_obj);
                let dst = self.pfg.var_pointer(cid, *lhs);
                self.add_pfg_edge(src, dst, PFGEdgeKind::ArrayLoad);
            }
            for callsite in &accesses.invokes {
                self.process_instance_call(cid, *callsite, cs_obj);
            }
        }
    }

    /// Resolves an instance call for one receiver object.
    fn process_instance_call(&mut self, cid: ContextId, callsite: CallSite, recv: CSObjId) {
        let acx = self.acx;
        let invoke = call_graph_builder::invoke_at(acx, callsite);
        let recv_cs_obj = self.cs_objs.cs_obj(recv);
        let recv_obj = self.heap_model.obj(recv_cs_obj.obj);
        let callee = match call_graph_builder::resolve_callee(acx, Some(&recv_obj.ty), invoke) {
            Some(callee) => callee,
            None => {
                warn!(
                    "Unable to resolve {:?} call to {} on {} in {}",
                    invoke.kind,
                    acx.program.method_ref_name(&invoke.method_ref),
                    self.heap_model.obj_name(&acx.program, recv_cs_obj.obj),
                    acx.method_name(callsite.method)
                );
                return;
            }
        };
        let callee_cid = self
            .ctx_strategy
            .new_instance_call_context(cid, callsite, recv_cs_obj, recv_obj, callee);

        self.add_call_edge(CSCallSite::new(cid, callsite), CSMethodId::new(callee_cid, callee), invoke);
        // The receiver flows into `this` even when the call edge is known,
        // since the edge may have been created for another receiver.
        if let Some(this_var) = acx.program.method(callee).this_var {
            let this_ptr = self.pfg.var_pointer(callee_cid, this_var);
            self.worklist.push_points_to(this_ptr, HybridPointsToSet::singleton(recv));
        }
    }

    /// Adds a call edge and, when it is new, the flow edges for argument
    /// passing and return values.
    fn add_call_edge(&mut self, callsite: CSCallSite, callee: CSMethodId, invoke: &InvokeExp) {
        let acx = self.acx;
        let caller = callsite.caller();
        if !self.call_graph.add_edge(callsite, caller, callee, invoke.kind) {
            return;
        }
        debug!(
            "New call edge {} -> {}",
            acx.method_name(caller.method),
            acx.method_name(callee.method)
        );
        self.worklist.push_method(callee);

        let callee_method = acx.program.method(callee.method);
        if invoke.args.len() != callee_method.params.len() {
            warn!(
                "Call to {} passes {} arguments to {} parameters",
                acx.method_name(callee.method),
                invoke.args.len(),
                callee_method.params.len()
            );
        }
        for (arg, param) in invoke.args.iter().zip(callee_method.params.iter()) {
            let src = self.pfg.var_pointer(caller.cid, *arg);
            let dst = self.pfg.var_pointer(callee.cid, *param);
            self.add_pfg_edge(src, dst, PFGEdgeKind::ParameterPassing);
        }
        if let Some(result) = invoke.result {
            let dst = self.pfg.var_pointer(caller.cid, result);
            for ret in &callee_method.return_vars {
                let src = self.pfg.var_pointer(callee.cid, *ret);
                self.add_pfg_edge(src, dst, PFGEdgeKind::Return);
            }
        }
    }

    /// Finalize the analysis.
    pub fn finalize(self) -> PointerAnalysisResult<'pta> {
        let context_names = (0..self.ctx_strategy.num_contexts())
            .map(|i| {
                self.ctx_strategy
                    .get_context_by_id(ContextId::from_usize(i))
                    .describe(&self.acx.program, &self.heap_model)
            })
            .collect();
        PointerAnalysisResult::new(
            self.acx,
            self.pt_data,
            self.pfg,
            self.call_graph,
            self.heap_model,
            self.cs_objs,
            context_names,
            self.num_iterations,
        )
    }
}

impl<'pta, S: ContextStrategy> PointerAnalysis<'pta> for ContextSensitivePTA<'pta, S> {
    fn analyze(&mut self) {
        let now = Instant::now();

        // Initialization for the analysis.
        self.initialize();

        // Solve the worklist problem.
        self.propagate();

        let elapsed = now.elapsed();
        info!("Pointer analysis completed.");
        info!("Analysis time: {}", humantime::format_duration(elapsed));
        info!(
            "Reachable methods: {}, call edges: {}, pointers: {}, contexts: {}",
            self.call_graph.reachable_methods().len(),
            self.call_graph.num_edges(),
            self.pfg.num_pointers(),
            self.num_contexts()
        );
    }

    fn into_result(self: Box<Self>) -> PointerAnalysisResult<'pta> {
        (*self).finalize()
    }
}
