// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Builds the pointer-relevant summary of a single method.
//!
//! The summary is part of the pointer-flow graph for the whole program.

use log::*;
use std::fmt::{Debug, Formatter, Result};

use crate::graph::method_pag::MethodPAG;
use crate::ir::analysis_context::AnalysisContext;
use crate::ir::call_site::CallSite;
use crate::ir::program::MethodId;
use crate::ir::stmt::Stmt;

/// A visitor that traverses the body of a method and records its statements
/// into the method's summary.
pub struct MethodPAGBuilder<'pta> {
    pub(crate) acx: &'pta AnalysisContext,
    pub(crate) method: MethodId,
    pub(crate) mpag: &'pta mut MethodPAG,
}

impl<'pta> Debug for MethodPAGBuilder<'pta> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        "MethodPAGBuilder".fmt(f)
    }
}

impl<'pta> MethodPAGBuilder<'pta> {
    pub fn new(acx: &'pta AnalysisContext, method: MethodId, mpag: &'pta mut MethodPAG) -> Self {
        debug!("Building MethodPAG for {:?}: {}", method, acx.method_name(method));
        MethodPAGBuilder { acx, method, mpag }
    }

    /// Builds the summary.
    pub fn build(&mut self) {
        let acx = self.acx;
        for (index, stmt) in acx.program.method(self.method).body.iter().enumerate() {
            self.visit_stmt(index, stmt);
        }
    }

    fn visit_stmt(&mut self, index: usize, stmt: &Stmt) {
        match stmt {
            Stmt::New { lhs, site } => self.mpag.add_allocation(*lhs, *site),
            Stmt::Copy { lhs, rhs } => self.mpag.add_copy(*rhs, *lhs),
            Stmt::LoadStatic { lhs, field } => self.mpag.add_static_load(*field, *lhs),
            Stmt::StoreStatic { field, rhs } => self.mpag.add_static_store(*rhs, *field),
            Stmt::LoadField { lhs, base, field } => self.mpag.add_load_field(*base, *field, *lhs),
            Stmt::StoreField { base, field, rhs } => self.mpag.add_store_field(*base, *field, *rhs),
            Stmt::LoadArray { lhs, base } => self.mpag.add_load_array(*base, *lhs),
            Stmt::StoreArray { base, rhs } => self.mpag.add_store_array(*base, *rhs),
            Stmt::Invoke(invoke) => {
                let callsite = CallSite::new(self.method, index);
                match invoke.receiver {
                    // Special calls are resolved statically, but are still
                    // processed per receiver object so that `this` is bound.
                    Some(recv) => self.mpag.add_instance_callsite(recv, callsite),
                    None => self.mpag.add_static_callsite(callsite),
                }
            }
            Stmt::Return(_) | Stmt::Nop => {}
        }
    }
}
