// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use log::*;

use self::andersen::AndersenPTA;
use self::context_sensitive::ContextSensitivePTA;
use self::context_strategy::{KCallSiteSensitive, KObjectSensitive, KTypeSensitive};
use self::heap_model::CSObjId;
use self::result::PointerAnalysisResult;
use crate::graph::pfg::PointerId;
use crate::ir::analysis_context::AnalysisContext;
use crate::pts_set::points_to::HybridPointsToSet;
use crate::pts_set::pt_data::PTData;

pub mod andersen;
pub mod context_sensitive;
pub mod context_strategy;
pub mod heap_model;
pub mod propagator;
pub mod result;

pub type PointsTo = HybridPointsToSet<CSObjId>;
pub type PTDataTy = PTData<PointerId, CSObjId, PointsTo>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PTAType {
    /// Context-insensitive.
    Andersen,
    CallSiteSensitive,
    ObjectSensitive,
    TypeSensitive,
}

pub trait PointerAnalysis<'pta> {
    fn analyze(&mut self);
    fn into_result(self: Box<Self>) -> PointerAnalysisResult<'pta>;
}

/// Runs the pointer analysis selected by the options of `acx`.
pub fn run_pointer_analysis(acx: &AnalysisContext) -> PointerAnalysisResult<'_> {
    let options = &acx.analysis_options;
    let k = options.context_depth as usize;
    let heap_k = options.heap_depth() as usize;
    info!(
        "Running {:?} pointer analysis (context depth {}, heap context depth {}, heap model {:?})",
        options.pta_type, k, heap_k, options.heap_model
    );
    let mut pta: Box<dyn PointerAnalysis<'_> + '_> = match options.pta_type {
        PTAType::Andersen => Box::new(AndersenPTA::new_andersen(acx)),
        PTAType::CallSiteSensitive => Box::new(ContextSensitivePTA::new(acx, KCallSiteSensitive::new(k, heap_k))),
        PTAType::ObjectSensitive => Box::new(ContextSensitivePTA::new(acx, KObjectSensitive::new(k, heap_k))),
        PTAType::TypeSensitive => Box::new(ContextSensitivePTA::new(acx, KTypeSensitive::new(k, heap_k))),
    };
    pta.analyze();
    pta.into_result()
}
