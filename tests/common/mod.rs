// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use std::path::Path;

use jpta::ir::analysis_context::AnalysisContext;
use jpta::ir::call_site::CallSite;
use jpta::ir::program::{MethodId, Program, VarId};
use jpta::pta::result::PointerAnalysisResult;
use jpta::pta::PTAType;
use jpta::util::options::AnalysisOptions;

/// Loads `tests/programs/<name>` and prepares it for the given analysis.
pub fn load(name: &str, pta_type: PTAType, context_depth: u32) -> AnalysisContext {
    let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/programs")).join(name);
    let program = Program::from_file(&path).unwrap();
    let options = AnalysisOptions {
        input: path.display().to_string(),
        pta_type,
        context_depth,
        ..AnalysisOptions::default()
    };
    AnalysisContext::new(program, options).unwrap()
}

pub fn method(acx: &AnalysisContext, class: &str, subsig: &str) -> MethodId {
    acx.program
        .find_method(class, subsig)
        .unwrap_or_else(|| panic!("no method <{}: {}>", class, subsig))
}

pub fn var(acx: &AnalysisContext, class: &str, subsig: &str, name: &str) -> VarId {
    let method = method(acx, class, subsig);
    acx.program
        .find_var(method, name)
        .unwrap_or_else(|| panic!("no variable {} in <{}: {}>", name, class, subsig))
}

pub fn callsite(acx: &AnalysisContext, class: &str, subsig: &str, stmt_index: usize) -> CallSite {
    CallSite::new(method(acx, class, subsig), stmt_index)
}

/// Name of the object allocated by statement `stmt_index` of `<class: subsig>`.
pub fn site(acx: &AnalysisContext, class: &str, subsig: &str, stmt_index: usize) -> String {
    let method = method(acx, class, subsig);
    let (id, _) = acx
        .program
        .alloc_sites
        .iter_enumerated()
        .find(|(_, s)| s.method == method && s.stmt_index == stmt_index)
        .unwrap_or_else(|| panic!("no allocation at <{}: {}>[{}]", class, subsig, stmt_index));
    acx.program.alloc_site_name(id)
}

/// Names of the objects `var` points to, contexts merged.
pub fn pts(result: &PointerAnalysisResult, var: VarId) -> Vec<String> {
    let mut names: Vec<String> = result
        .ci_points_to(var)
        .into_iter()
        .map(|obj| result.obj_name(obj))
        .collect();
    names.sort();
    names
}

pub fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

pub fn signatures(acx: &AnalysisContext, methods: &[MethodId]) -> Vec<String> {
    sorted(methods.iter().map(|m| acx.program.method_signature(*m)).collect())
}
