// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Context as _;
use itertools::Itertools;
use log::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};

use super::call_graph_stat::CallGraphStat;
use super::pta_statistics::PTAStat;
use crate::cha::ClassHierarchyAnalysis;
use crate::graph::call_graph::CICallGraph;
use crate::ir::analysis_context::AnalysisContext;
use crate::ir::call_site::CallKind;
use crate::ir::program::{MethodId, Program};
use crate::pta::result::PointerAnalysisResult;

/// Opens `path` for writing, `stdout` meaning the standard output.
fn create_writer(path: &str) -> anyhow::Result<BufWriter<Box<dyn Write>>> {
    let writer = match path {
        "stdout" => Box::new(std::io::stdout()) as Box<dyn Write>,
        _ => Box::new(File::create(path).with_context(|| format!("unable to create {}", path))?) as Box<dyn Write>,
    };
    Ok(BufWriter::new(writer))
}

/// Writes every output requested in the options of the analysis.
pub fn dump_results(result: &PointerAnalysisResult) -> anyhow::Result<()> {
    let acx = result.acx();
    let options = &acx.analysis_options;

    // dump points-to results
    if let Some(pts_output) = &options.pts_output {
        info!("Dumping points-to results...");
        dump_ci_pts(result, pts_output)?;
    }

    // dump call graph
    if let Some(cg_output) = &options.call_graph_output {
        info!("Dumping call graph...");
        dump_call_graph(acx, result.ci_call_graph(), cg_output)?;
    }

    if let Some(dead_output) = &options.dead_methods_output {
        info!("Dumping dead methods...");
        dump_dead_methods(&acx.program, &result.dead_methods(), dead_output)?;
    }

    if let Some(json_output) = &options.json_output {
        info!("Dumping json results...");
        let json = JsonResult::from_pta(result);
        dump_json(&json, json_output)?;
    }

    if options.dump_stats {
        let mut stat_writer = BufWriter::new(std::io::stdout());
        PTAStat::new(result).dump_stats(&mut stat_writer)?;
        stat_writer.flush()?;
    }
    Ok(())
}

/// Writes the outputs that make sense for a call graph built without points-to information.
pub fn dump_cha_results(cha: &ClassHierarchyAnalysis) -> anyhow::Result<()> {
    let acx = cha.acx;
    let options = &acx.analysis_options;
    if options.pts_output.is_some() {
        warn!("Class hierarchy analysis computes no points-to sets, ignoring --dump-pts");
    }
    if let Some(cg_output) = &options.call_graph_output {
        info!("Dumping call graph...");
        dump_call_graph(acx, cha.call_graph(), cg_output)?;
    }
    if let Some(dead_output) = &options.dead_methods_output {
        info!("Dumping dead methods...");
        dump_dead_methods(&acx.program, &cha.dead_methods(), dead_output)?;
    }
    if let Some(json_output) = &options.json_output {
        info!("Dumping json results...");
        let json = JsonResult::from_call_graph(&acx.program, cha.call_graph(), cha.dead_methods());
        dump_json(&json, json_output)?;
    }
    if options.dump_stats {
        let mut stat_writer = BufWriter::new(std::io::stdout());
        writeln!(stat_writer, "##########################################################")?;
        CallGraphStat::new(cha.call_graph()).dump(&mut stat_writer)?;
        writeln!(stat_writer, "#Statements in reachable methods: {}", cha.num_stmts)?;
        writeln!(stat_writer, "##########################################################")?;
        stat_writer.flush()?;
    }
    Ok(())
}

pub fn dump_call_graph(acx: &AnalysisContext, call_graph: &CICallGraph, dot_path: &str) -> anyhow::Result<()> {
    let mut writer = create_writer(dot_path)?;
    writer.write_all(call_graph.to_dot(acx).as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn dump_dead_methods(program: &Program, dead_methods: &[MethodId], path: &str) -> anyhow::Result<()> {
    let mut writer = create_writer(path)?;
    for method in dead_methods {
        writeln!(writer, "{}", program.method_signature(*method))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the context-insensitive points-to sets, grouped by method.
pub fn dump_ci_pts(result: &PointerAnalysisResult, path: &str) -> anyhow::Result<()> {
    let program = &result.acx().program;
    let mut pts_writer = create_writer(path)?;
    for method in result.reachable_methods() {
        writeln!(pts_writer, "{:?} - {}", method, program.method_signature(method))?;
        for var in program.method_locals(method) {
            let pts = result.ci_points_to(var);
            if pts.is_empty() {
                continue;
            }
            writeln!(
                pts_writer,
                "\t{} ({}) ==> {{ {} }}",
                program.var(var).name,
                pts.len(),
                pts.iter().map(|obj| result.obj_name(*obj)).join(" ")
            )?;
        }
    }
    let mut header = false;
    for (field_id, field) in program.fields.iter_enumerated() {
        if !field.is_static {
            continue;
        }
        let pts = result.static_field_points_to(field_id);
        if pts.is_empty() {
            continue;
        }
        if !header {
            writeln!(pts_writer, "Static fields")?;
            header = true;
        }
        writeln!(
            pts_writer,
            "\t{} ({}) ==> {{ {} }}",
            program.field_signature(field_id),
            pts.len(),
            pts.iter().map(|obj| result.obj_name(*obj)).join(" ")
        )?;
    }
    pts_writer.flush()?;
    Ok(())
}

pub fn dump_json<T: Serialize>(value: &T, path: &str) -> anyhow::Result<()> {
    let mut writer = create_writer(path)?;
    serde_json::to_writer_pretty(&mut writer, value).context("unable to serialize results")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct JsonCallEdge {
    pub caller: String,
    pub stmt_index: usize,
    pub kind: CallKind,
    pub callee: String,
}

#[derive(Debug, Serialize)]
pub struct JsonResult {
    pub reachable_methods: Vec<String>,
    pub call_edges: Vec<JsonCallEdge>,
    pub dead_methods: Vec<String>,
    /// Variable name to the objects it may point to, contexts merged.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub points_to: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<PTAStat>,
}

impl JsonResult {
    pub fn from_call_graph(program: &Program, call_graph: &CICallGraph, dead_methods: Vec<MethodId>) -> Self {
        let mut reachable = call_graph.reachable_methods().to_vec();
        reachable.sort();
        let mut edges = call_graph.edges().collect_vec();
        edges.sort_by_key(|(callsite, _, callee, _)| (*callsite, *callee));
        JsonResult {
            reachable_methods: reachable.iter().map(|m| program.method_signature(*m)).collect(),
            call_edges: edges
                .into_iter()
                .map(|(callsite, caller, callee, kind)| JsonCallEdge {
                    caller: program.method_signature(caller),
                    stmt_index: callsite.stmt_index,
                    kind,
                    callee: program.method_signature(callee),
                })
                .collect(),
            dead_methods: dead_methods.iter().map(|m| program.method_signature(*m)).collect(),
            points_to: BTreeMap::new(),
            statistics: None,
        }
    }

    pub fn from_pta(result: &PointerAnalysisResult) -> Self {
        let program = &result.acx().program;
        let mut json = Self::from_call_graph(program, result.ci_call_graph(), result.dead_methods());
        for method in result.reachable_methods() {
            for var in program.method_locals(method) {
                let pts = result.ci_points_to(var);
                if !pts.is_empty() {
                    json.points_to.insert(
                        program.var_name(var),
                        pts.iter().map(|obj| result.obj_name(*obj)).collect_vec(),
                    );
                }
            }
        }
        json.statistics = Some(PTAStat::new(result));
        json
    }
}
