// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The result of a finished pointer analysis.
//!
//! The result owns the final points-to data, the pointer-flow graph and the
//! call graph, and answers both context-sensitive queries (a variable under a
//! context) and context-insensitive ones, which merge all contexts.

use std::collections::{BTreeSet, HashMap};

use super::heap_model::{CSObj, CSObjCache, CSObjId, HeapModel, ObjId};
use super::{PTDataTy, PointsTo};
use crate::graph::call_graph::{CICallGraph, CSCallGraph};
use crate::graph::pfg::{Pointer, PointerFlowGraph, PointerId};
use crate::ir::analysis_context::AnalysisContext;
use crate::ir::call_site::CallSite;
use crate::ir::context::ContextId;
use crate::ir::program::{FieldId, MethodId, VarId};
use crate::pts_set::points_to::PointsToSet;

pub struct PointerAnalysisResult<'pta> {
    pub(crate) acx: &'pta AnalysisContext,
    pub(crate) pt_data: PTDataTy,
    pub(crate) pfg: PointerFlowGraph,
    pub(crate) call_graph: CSCallGraph,
    pub(crate) ci_call_graph: CICallGraph,
    pub(crate) heap_model: HeapModel,
    pub(crate) cs_objs: CSObjCache,
    /// Printable form of every context, indexed by context id.
    pub(crate) context_names: Vec<String>,
    pub(crate) num_iterations: usize,
    /// Pointers of each variable, one per context it was analyzed in.
    var_pointers: HashMap<VarId, Vec<(ContextId, PointerId)>>,
}

impl<'pta> PointerAnalysisResult<'pta> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        acx: &'pta AnalysisContext,
        pt_data: PTDataTy,
        pfg: PointerFlowGraph,
        call_graph: CSCallGraph,
        heap_model: HeapModel,
        cs_objs: CSObjCache,
        context_names: Vec<String>,
        num_iterations: usize,
    ) -> Self {
        let mut var_pointers: HashMap<VarId, Vec<(ContextId, PointerId)>> = HashMap::new();
        for (pointer, id) in &pfg.values {
            if let Pointer::Var(cid, var) = pointer {
                var_pointers.entry(*var).or_default().push((*cid, *id));
            }
        }
        for pointers in var_pointers.values_mut() {
            pointers.sort();
        }
        let ci_call_graph = call_graph.project();
        PointerAnalysisResult {
            acx,
            pt_data,
            pfg,
            call_graph,
            ci_call_graph,
            heap_model,
            cs_objs,
            context_names,
            num_iterations,
            var_pointers,
        }
    }

    #[inline]
    pub fn acx(&self) -> &'pta AnalysisContext {
        self.acx
    }

    #[inline]
    pub fn pt_data(&self) -> &PTDataTy {
        &self.pt_data
    }

    #[inline]
    pub fn pfg(&self) -> &PointerFlowGraph {
        &self.pfg
    }

    #[inline]
    pub fn heap_model(&self) -> &HeapModel {
        &self.heap_model
    }

    /// The context-sensitive call graph.
    #[inline]
    pub fn call_graph(&self) -> &CSCallGraph {
        &self.call_graph
    }

    /// The call graph with contexts merged away.
    #[inline]
    pub fn ci_call_graph(&self) -> &CICallGraph {
        &self.ci_call_graph
    }

    #[inline]
    pub fn cs_obj(&self, id: CSObjId) -> CSObj {
        self.cs_objs.cs_obj(id)
    }

    pub fn num_cs_objs(&self) -> usize {
        self.cs_objs.len()
    }

    pub fn num_contexts(&self) -> usize {
        self.context_names.len()
    }

    pub fn context_name(&self, cid: ContextId) -> &str {
        self.context_names.get(cid.as_usize()).map_or("[]", |s| s.as_str())
    }

    /// `[ctx]:NewObj{...}`
    pub fn cs_obj_name(&self, id: CSObjId) -> String {
        let cs_obj = self.cs_obj(id);
        format!(
            "{}:{}",
            self.context_name(cs_obj.cid),
            self.heap_model.obj_name(&self.acx.program, cs_obj.obj)
        )
    }

    pub fn obj_name(&self, obj: ObjId) -> String {
        self.heap_model.obj_name(&self.acx.program, obj)
    }

    fn pointer_pts(&self, pointer: &Pointer) -> Option<&PointsTo> {
        let id = self.pfg.get_node_id(pointer)?;
        self.pt_data.get_pts(id)
    }

    /// Drops heap contexts from the objects in `pts` and adds them to `objs`.
    fn project_into(&self, pts: &PointsTo, objs: &mut BTreeSet<ObjId>) {
        objs.extend(pts.iter().map(|id| self.cs_objs.cs_obj(id).obj));
    }

    /// Contexts `var` has been analyzed in.
    pub fn contexts_of(&self, var: VarId) -> Vec<ContextId> {
        self.var_pointers
            .get(&var)
            .map(|pointers| pointers.iter().map(|(cid, _)| *cid).collect())
            .unwrap_or_default()
    }

    /// The points-to set of `var` under context `cid`.
    pub fn cs_points_to(&self, cid: ContextId, var: VarId) -> Option<&PointsTo> {
        self.pointer_pts(&Pointer::Var(cid, var))
    }

    /// Objects `var` may point to under any context.
    pub fn ci_points_to(&self, var: VarId) -> BTreeSet<ObjId> {
        let mut objs = BTreeSet::new();
        if let Some(pointers) = self.var_pointers.get(&var) {
            for (_, id) in pointers {
                if let Some(pts) = self.pt_data.get_pts(*id) {
                    self.project_into(pts, &mut objs);
                }
            }
        }
        objs
    }

    pub fn static_field_points_to(&self, field: FieldId) -> BTreeSet<ObjId> {
        let mut objs = BTreeSet::new();
        if let Some(pts) = self.pointer_pts(&Pointer::StaticField(field)) {
            self.project_into(pts, &mut objs);
        }
        objs
    }

    /// Objects stored in field `field` of `obj`, under any heap context.
    pub fn instance_field_points_to(&self, obj: ObjId, field: FieldId) -> BTreeSet<ObjId> {
        self.merged_points_to(|pointer| match pointer {
            Pointer::InstanceField(base, f) => *f == field && self.cs_objs.cs_obj(*base).obj == obj,
            _ => false,
        })
    }

    /// Objects stored in any element of the array `obj`, under any heap context.
    pub fn array_points_to(&self, obj: ObjId) -> BTreeSet<ObjId> {
        self.merged_points_to(|pointer| match pointer {
            Pointer::ArrayIndex(base) => self.cs_objs.cs_obj(*base).obj == obj,
            _ => false,
        })
    }

    fn merged_points_to<F: Fn(&Pointer) -> bool>(&self, matches: F) -> BTreeSet<ObjId> {
        let mut objs = BTreeSet::new();
        for (pointer, id) in &self.pfg.values {
            if matches(pointer) {
                if let Some(pts) = self.pt_data.get_pts(*id) {
                    self.project_into(pts, &mut objs);
                }
            }
        }
        objs
    }

    /// Two variables may alias if they may point to a common object.
    pub fn may_alias(&self, v1: VarId, v2: VarId) -> bool {
        let pts1 = self.ci_points_to(v1);
        if pts1.is_empty() {
            return false;
        }
        self.ci_points_to(v2).iter().any(|obj| pts1.contains(obj))
    }

    /// Methods reachable from the entry, sorted by id.
    pub fn reachable_methods(&self) -> Vec<MethodId> {
        let mut methods = self.ci_call_graph.reachable_methods().to_vec();
        methods.sort();
        methods
    }

    #[inline]
    pub fn is_reachable(&self, method: MethodId) -> bool {
        self.ci_call_graph.is_reachable(&method)
    }

    /// Methods `callsite` may invoke under any context.
    pub fn callees_of(&self, callsite: CallSite) -> Vec<MethodId> {
        let mut callees = self.ci_call_graph.get_callees(&callsite);
        callees.sort();
        callees
    }

    /// Non-abstract methods that are never reached from the entry.
    pub fn dead_methods(&self) -> Vec<MethodId> {
        self.ci_call_graph.dead_methods(&self.acx.program)
    }
}

#[cfg(test)]
mod test {
    use crate::ir::analysis_context::AnalysisContext;
    use crate::ir::program::Program;
    use crate::pta::run_pointer_analysis;
    use crate::pta::PTAType;
    use crate::util::options::AnalysisOptions;

    const PROGRAM: &str = r#"{
        "classes": [
            {"name": "Box", "fields": [{"name": "item"}]},
            {"name": "Item"},
            {"name": "Main", "fields": [{"name": "cache", "static": true}], "methods": [
                {"name": "main", "static": true, "body": [
                    {"kind": "new", "lhs": "b", "type": "Box"},
                    {"kind": "new", "lhs": "i", "type": "Item"},
                    {"kind": "store", "base": "b", "field": "Box.item", "rhs": "i"},
                    {"kind": "new", "lhs": "arr", "type": "Item[]"},
                    {"kind": "store_array", "base": "arr", "rhs": "i"},
                    {"kind": "store", "field": "Main.cache", "rhs": "arr"},
                    {"kind": "load", "lhs": "c", "field": "Main.cache"},
                    {"kind": "load_array", "lhs": "j", "base": "c"}
                ]},
                {"name": "unused", "static": true}
            ]}
        ],
        "entry": {"class": "Main", "method": "main/0"}
    }"#;

    #[test]
    fn queries_merge_contexts() {
        let program = Program::from_json_str(PROGRAM).unwrap();
        let options = AnalysisOptions {
            pta_type: PTAType::Andersen,
            ..AnalysisOptions::default()
        };
        let acx = AnalysisContext::new(program, options).unwrap();
        let result = run_pointer_analysis(&acx);
        let program = &acx.program;
        let main = program.find_method("Main", "main/0").unwrap();
        let var = |name| program.find_var(main, name).unwrap();

        let box_obj = *result.ci_points_to(var("b")).iter().next().unwrap();
        let arr_obj = *result.ci_points_to(var("arr")).iter().next().unwrap();
        let item = result.ci_points_to(var("i"));
        let item_field = program.class(program.class_by_name("Box").unwrap()).fields[0];
        let cache = program.class(program.class_by_name("Main").unwrap()).fields[0];

        assert_eq!(result.instance_field_points_to(box_obj, item_field), item);
        assert_eq!(result.array_points_to(arr_obj), item);
        assert_eq!(result.static_field_points_to(cache).len(), 1);
        assert_eq!(result.ci_points_to(var("j")), item);
        assert!(result.may_alias(var("i"), var("j")));
        assert!(!result.may_alias(var("b"), var("i")));
        assert_eq!(
            result.dead_methods(),
            vec![program.find_method("Main", "unused/0").unwrap()]
        );
    }
}
