// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The context-insensitive (Andersen-style) pointer analysis.
//!
//! It is the context-sensitive solver run with a strategy that only ever
//! produces the empty context, so every variable and object has exactly one
//! abstract instance.

use super::context_sensitive::ContextSensitivePTA;
use super::context_strategy::ContextInsensitive;
use crate::ir::analysis_context::AnalysisContext;

pub type AndersenPTA<'pta> = ContextSensitivePTA<'pta, ContextInsensitive>;

/// Constructor
impl<'pta> ContextSensitivePTA<'pta, ContextInsensitive> {
    pub fn new_andersen(acx: &'pta AnalysisContext) -> Self {
        ContextSensitivePTA::new(acx, ContextInsensitive::new())
    }
}
