// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use log::*;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use serde::Serialize;

use super::call_graph_stat::CallGraphStat;
use crate::graph::pfg::Pointer;
use crate::pta::heap_model::ObjId;
use crate::pta::result::PointerAnalysisResult;
use crate::pts_set::points_to::PointsToSet;

/// Points-to statistics for one kind of pointers.
#[derive(Debug, Default, Serialize)]
pub struct PtsStat {
    pub pointers: usize,
    pub relations: usize,
    pub avg_pts_size: f64,
}

impl PtsStat {
    fn new(pointers: usize, relations: usize) -> Self {
        let avg_pts_size = if pointers == 0 {
            0.0
        } else {
            relations as f64 / pointers as f64
        };
        PtsStat {
            pointers,
            relations,
            avg_pts_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PTAStat {
    pub call_graph: CallGraphStat,
    /// Reachable (context, method) pairs.
    pub cs_reachable_methods: usize,
    pub cs_call_edges: usize,
    pub contexts: usize,
    pub objects: usize,
    pub cs_objects: usize,
    pub pfg_nodes: usize,
    pub pfg_edges: usize,
    /// Every pointer kind, contexts kept.
    pub cs_pts: PtsStat,
    /// Variables only, contexts kept.
    pub cs_var_pts: PtsStat,
    /// Variables only, contexts merged.
    pub ci_var_pts: PtsStat,
    pub worklist_iterations: usize,
}

impl PTAStat {
    pub fn new(result: &PointerAnalysisResult) -> Self {
        let pfg = result.pfg();
        let pts_map = result.pt_data().get_pts_map();

        let mut num_cs_pointers = 0;
        let mut num_cs_relations = 0;
        let mut num_cs_var_pointers = 0;
        let mut num_cs_var_relations = 0;
        let mut ci_var_pts: HashMap<_, HashSet<ObjId>> = HashMap::new();
        for (ptr, pts) in pts_map {
            if pts.is_empty() {
                continue;
            }
            num_cs_pointers += 1;
            num_cs_relations += pts.count();
            if let Pointer::Var(_, var) = pfg.node_pointer(*ptr) {
                num_cs_var_pointers += 1;
                num_cs_var_relations += pts.count();
                ci_var_pts
                    .entry(*var)
                    .or_default()
                    .extend(pts.iter().map(|o| result.cs_obj(o).obj));
            }
        }
        let num_ci_var_relations = ci_var_pts.values().map(|pts| pts.len()).sum();

        let cs_call_graph = result.call_graph();
        PTAStat {
            call_graph: CallGraphStat::new(result.ci_call_graph()),
            cs_reachable_methods: cs_call_graph.reachable_methods().len(),
            cs_call_edges: cs_call_graph.num_edges(),
            contexts: result.num_contexts(),
            objects: result.heap_model().num_objs(),
            cs_objects: result.num_cs_objs(),
            pfg_nodes: pfg.num_pointers(),
            pfg_edges: pfg.num_edges(),
            cs_pts: PtsStat::new(num_cs_pointers, num_cs_relations),
            cs_var_pts: PtsStat::new(num_cs_var_pointers, num_cs_var_relations),
            ci_var_pts: PtsStat::new(ci_var_pts.len(), num_ci_var_relations),
            worklist_iterations: result.num_iterations,
        }
    }

    pub fn dump_stats<W: Write>(&self, stat_writer: &mut W) -> io::Result<()> {
        info!("Dumping pta statistics...");
        writeln!(stat_writer, "##########################################################")?;
        self.call_graph.dump(stat_writer)?;
        writeln!(stat_writer, "#CS reachable methods: {}", self.cs_reachable_methods)?;
        writeln!(stat_writer, "#CS call graph edges: {}", self.cs_call_edges)?;
        writeln!(stat_writer, "----------------------------------------------------------")?;
        writeln!(stat_writer, "#Contexts: {}", self.contexts)?;
        writeln!(stat_writer, "#Objects: {}", self.objects)?;
        writeln!(stat_writer, "#CS objects: {}", self.cs_objects)?;
        writeln!(stat_writer, "#PFG nodes: {}", self.pfg_nodes)?;
        writeln!(stat_writer, "#PFG edges: {}", self.pfg_edges)?;
        writeln!(stat_writer, "#Worklist iterations: {}", self.worklist_iterations)?;
        writeln!(stat_writer, "----------------------------------------------------------")?;
        Self::dump_pts_stat(stat_writer, "CS Points-to Statistics", &self.cs_pts)?;
        Self::dump_pts_stat(stat_writer, "CS Variable Points-to Statistics", &self.cs_var_pts)?;
        Self::dump_pts_stat(stat_writer, "CI Variable Points-to Statistics", &self.ci_var_pts)?;
        writeln!(stat_writer, "##########################################################")?;
        Ok(())
    }

    fn dump_pts_stat<W: Write>(stat_writer: &mut W, title: &str, stat: &PtsStat) -> io::Result<()> {
        writeln!(stat_writer, "{}: ", title)?;
        writeln!(stat_writer, "#Pointers: {}", stat.pointers)?;
        writeln!(stat_writer, "#Points-to relations: {}", stat.relations)?;
        writeln!(stat_writer, "#Avg points-to size: {:.2}", stat.avg_pts_size)?;
        Ok(())
    }
}
