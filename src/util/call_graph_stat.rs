// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, Write};

use serde::Serialize;

use crate::graph::call_graph::{CGCallSite, CGMethod, CallGraph};
use crate::ir::call_site::{CallKind, CallSite};

/// Call graph statistics with contexts merged away.
#[derive(Debug, Default, Serialize)]
pub struct CallGraphStat {
    pub reachable_methods: usize,
    pub call_edges: usize,
    /// Resolved call sites, per call kind.
    pub call_sites: BTreeMap<CallKind, usize>,
    /// Call edges, per call kind.
    pub call_edges_by_kind: BTreeMap<CallKind, usize>,
    /// Virtual and interface call sites resolved to exactly one target.
    pub mono_call_sites: usize,
    /// Virtual and interface call sites resolved to more than one target.
    pub poly_call_sites: usize,
}

impl CallGraphStat {
    pub fn new<F: CGMethod, S: CGCallSite>(call_graph: &CallGraph<F, S>) -> Self {
        let reachable_methods = call_graph
            .reachable_methods()
            .iter()
            .map(|m| m.method_id())
            .collect::<HashSet<_>>()
            .len();

        let mut callees: HashMap<CallSite, (CallKind, HashSet<_>)> = HashMap::new();
        for (callsite, _caller, callee, kind) in call_graph.edges() {
            callees
                .entry(callsite.callsite())
                .or_insert_with(|| (kind, HashSet::new()))
                .1
                .insert(callee.method_id());
        }

        let mut stat = CallGraphStat {
            reachable_methods,
            ..CallGraphStat::default()
        };
        for (kind, targets) in callees.values() {
            *stat.call_sites.entry(*kind).or_default() += 1;
            *stat.call_edges_by_kind.entry(*kind).or_default() += targets.len();
            stat.call_edges += targets.len();
            if kind.is_dynamic_dispatch() {
                if targets.len() == 1 {
                    stat.mono_call_sites += 1;
                } else {
                    stat.poly_call_sites += 1;
                }
            }
        }
        stat
    }

    pub fn dump<W: Write>(&self, stat_writer: &mut W) -> io::Result<()> {
        writeln!(stat_writer, "Call Graph Statistics: ")?;
        writeln!(stat_writer, "#Reachable methods: {}", self.reachable_methods)?;
        writeln!(stat_writer, "#Call graph edges: {}", self.call_edges)?;
        for (kind, num) in &self.call_sites {
            writeln!(
                stat_writer,
                "#{:?} call sites: {} ({} edges)",
                kind,
                num,
                self.call_edges_by_kind.get(kind).copied().unwrap_or_default()
            )?;
        }
        writeln!(stat_writer, "#Monomorphic dynamic call sites: {}", self.mono_call_sites)?;
        writeln!(stat_writer, "#Polymorphic dynamic call sites: {}", self.poly_call_sites)?;
        Ok(())
    }
}
