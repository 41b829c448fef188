// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! This module provides essential functions for resolving call targets.

use log::*;
use std::collections::{HashSet, VecDeque};

use crate::ir::analysis_context::AnalysisContext;
use crate::ir::call_site::CallSite;
use crate::ir::program::{JType, MethodId};
use crate::ir::stmt::{CallKind, InvokeExp};

/// Returns the invoke expression at `callsite`.
///
/// Call sites are only ever created for invoke statements, so a mismatch is
/// an internal inconsistency.
pub fn invoke_at(acx: &AnalysisContext, callsite: CallSite) -> &InvokeExp {
    match acx.program.method(callsite.method).body[callsite.stmt_index].as_invoke() {
        Some(invoke) => invoke,
        None => panic!("no invoke statement at {:?}", callsite),
    }
}

/// Resolves the callee of `invoke` given the type of the receiver object.
///
/// Static and special calls are resolved against the class named by the
/// method reference, virtual and interface calls against `recv_type`.
/// Returns `None` if no non-abstract target exists or the receiver class is
/// not a subtype of the referenced class.
pub fn resolve_callee(acx: &AnalysisContext, recv_type: Option<&JType>, invoke: &InvokeExp) -> Option<MethodId> {
    let method_ref = &invoke.method_ref;
    match invoke.kind {
        CallKind::Static | CallKind::Special => {
            acx.hierarchy
                .dispatch(&acx.program, method_ref.class, &method_ref.subsignature)
        }
        CallKind::Virtual | CallKind::Interface => match recv_type {
            Some(JType::Class(class)) if !acx.hierarchy.is_subclass(&acx.program, *class, method_ref.class) => {
                debug!(
                    "Receiver of type {} is not a subtype of {}",
                    acx.program.class(*class).name,
                    acx.program.class(method_ref.class).name
                );
                None
            }
            Some(ty) => acx
                .hierarchy
                .dispatch_on_type(&acx.program, ty, &method_ref.subsignature),
            None => {
                debug!("Dynamic call {:?} resolved without a receiver type", method_ref);
                None
            }
        },
    }
}

/// Resolves all possible targets of `invoke` by class hierarchy analysis.
///
/// Virtual and interface calls take the first non-abstract override found in
/// every subclass, subinterface and implementor of the declared class.
pub fn resolve_cha_targets(acx: &AnalysisContext, invoke: &InvokeExp) -> Vec<MethodId> {
    let method_ref = &invoke.method_ref;
    let hierarchy = &acx.hierarchy;
    let mut targets = Vec::new();
    if hierarchy.resolve_method_ref(&acx.program, method_ref).is_none() {
        debug!("Method reference {} is not declared", acx.program.method_ref_name(method_ref));
        return targets;
    }
    match invoke.kind {
        CallKind::Static | CallKind::Special => {
            targets.extend(hierarchy.dispatch(&acx.program, method_ref.class, &method_ref.subsignature));
        }
        CallKind::Virtual | CallKind::Interface => {
            let mut visited = HashSet::new();
            let mut worklist = VecDeque::from([method_ref.class]);
            while let Some(class) = worklist.pop_front() {
                if !visited.insert(class) {
                    continue;
                }
                if let Some(target) = hierarchy.dispatch(&acx.program, class, &method_ref.subsignature) {
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
                if acx.program.class(class).is_interface {
                    worklist.extend(hierarchy.direct_subinterfaces_of(class));
                    worklist.extend(hierarchy.direct_implementors_of(class));
                } else {
                    worklist.extend(hierarchy.direct_subclasses_of(class));
                }
            }
        }
    }
    targets
}
