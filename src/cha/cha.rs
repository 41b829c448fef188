// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::*;

use crate::builder::call_graph_builder;
use crate::graph::call_graph::CICallGraph;
use crate::ir::analysis_context::AnalysisContext;
use crate::ir::call_site::CallSite;
use crate::ir::program::MethodId;

/// Builds a call graph from declared types only. Every virtual or interface
/// call may reach the overrides in all subtypes of the declared class, so
/// the result over-approximates the one built by the pointer analysis.
pub struct ClassHierarchyAnalysis<'a> {
    /// The analysis context
    pub(crate) acx: &'a AnalysisContext,
    /// Call graph
    pub call_graph: CICallGraph,

    /// Methods waiting to be visited
    worklist: VecDeque<MethodId>,

    pub num_stmts: usize,

    pub analysis_time: Duration,
}

impl<'a> ClassHierarchyAnalysis<'a> {
    pub fn new(acx: &'a AnalysisContext) -> Self {
        ClassHierarchyAnalysis {
            acx,
            call_graph: CICallGraph::new(),
            worklist: VecDeque::new(),
            num_stmts: 0,
            analysis_time: Duration::ZERO,
        }
    }

    pub fn analyze(&mut self) {
        let now = Instant::now();

        let entry_point = self.acx.entry_point;
        self.call_graph.add_entry_method(entry_point);
        self.worklist.push_back(entry_point);

        while let Some(method) = self.worklist.pop_front() {
            self.process_reachable_method(method);
        }

        self.analysis_time = now.elapsed();
        info!("Class hierarchy analysis completed.");
        info!(
            "Class hierarchy analysis time: {}",
            humantime::format_duration(self.analysis_time)
        );
        info!(
            "Reachable methods: {}, call edges: {}",
            self.call_graph.reachable_methods().len(),
            self.call_graph.num_edges()
        );
    }

    fn process_reachable_method(&mut self, method: MethodId) {
        if !self.call_graph.add_reachable_method(method) {
            return;
        }
        let acx = self.acx;
        debug!("Visiting method {}", acx.method_name(method));
        let body = &acx.program.method(method).body;
        self.num_stmts += body.len();
        for (index, stmt) in body.iter().enumerate() {
            let invoke = match stmt.as_invoke() {
                Some(invoke) => invoke,
                None => continue,
            };
            let callsite = CallSite::new(method, index);
            let targets = call_graph_builder::resolve_cha_targets(acx, invoke);
            if targets.is_empty() {
                warn!(
                    "No target found for {:?} call to {} in {}",
                    invoke.kind,
                    acx.program.method_ref_name(&invoke.method_ref),
                    acx.method_name(method)
                );
            }
            for target in targets {
                if self.call_graph.add_edge(callsite, method, target, invoke.kind) {
                    self.worklist.push_back(target);
                }
            }
        }
    }

    #[inline]
    pub fn call_graph(&self) -> &CICallGraph {
        &self.call_graph
    }

    /// Non-abstract methods that are never reached from the entry.
    pub fn dead_methods(&self) -> Vec<MethodId> {
        self.call_graph.dead_methods(&self.acx.program)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::program::Program;
    use crate::util::options::AnalysisOptions;

    const PROGRAM: &str = r#"{
        "classes": [
            {"name": "Animal", "abstract": true, "methods": [
                {"name": "speak", "abstract": true}
            ]},
            {"name": "Dog", "super": "Animal", "methods": [{"name": "speak"}]},
            {"name": "Cat", "super": "Animal", "methods": [{"name": "speak"}]},
            {"name": "Main", "methods": [
                {"name": "main", "static": true, "body": [
                    {"kind": "new", "lhs": "a", "type": "Dog"},
                    {"kind": "invoke", "call": "virtual", "class": "Animal", "method": "speak/0", "receiver": "a"}
                ]}
            ]}
        ],
        "entry": {"class": "Main", "method": "main/0"}
    }"#;

    #[test]
    fn virtual_calls_reach_every_override() {
        let program = Program::from_json_str(PROGRAM).unwrap();
        let acx = AnalysisContext::new(program, AnalysisOptions::default()).unwrap();
        let mut cha = ClassHierarchyAnalysis::new(&acx);
        cha.analyze();
        let main = acx.program.find_method("Main", "main/0").unwrap();
        let dog = acx.program.find_method("Dog", "speak/0").unwrap();
        let cat = acx.program.find_method("Cat", "speak/0").unwrap();
        let mut callees = cha.call_graph().get_callees(&CallSite::new(main, 1));
        callees.sort();
        assert_eq!(callees, vec![dog, cat]);
        assert!(cha.dead_methods().is_empty());
    }
}
