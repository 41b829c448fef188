// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::ir::call_site::CallSite;
use crate::ir::program::{AllocSiteId, FieldId, MethodId, VarId};

/// Statements whose effect depends on the objects a variable points to.
/// They are replayed every time the variable's points-to set grows.
#[derive(Debug, Default)]
pub struct VarAccesses {
    /// `var.f = rhs`, as `(f, rhs)`
    pub(crate) store_fields: Vec<(FieldId, VarId)>,
    /// `lhs = var.f`, as `(f, lhs)`
    pub(crate) load_fields: Vec<(FieldId, VarId)>,
    /// `var[*] = rhs`
    pub(crate) store_arrays: Vec<VarId>,
    /// `lhs = var[*]`
    pub(crate) load_arrays: Vec<VarId>,
    /// Instance calls whose receiver is `var`.
    pub(crate) invokes: Vec<CallSite>,
}

impl VarAccesses {
    pub fn is_empty(&self) -> bool {
        self.store_fields.is_empty()
            && self.load_fields.is_empty()
            && self.store_arrays.is_empty()
            && self.load_arrays.is_empty()
            && self.invokes.is_empty()
    }
}

/// Pointer-relevant summary of one method body, independent of any context.
/// In a context-sensitive analysis each method is summarized once and the
/// summary is instantiated for every context it becomes reachable in.
#[derive(Debug)]
pub struct MethodPAG {
    pub(crate) method: MethodId,
    /// `lhs = new T`, as `(lhs, site)`
    pub(crate) allocations: Vec<(VarId, AllocSiteId)>,
    /// `dst = src`, as `(src, dst)`
    pub(crate) copies: Vec<(VarId, VarId)>,
    /// `lhs = C.f`, as `(f, lhs)`
    pub(crate) static_loads: Vec<(FieldId, VarId)>,
    /// `C.f = rhs`, as `(rhs, f)`
    pub(crate) static_stores: Vec<(VarId, FieldId)>,
    /// Calls without a receiver; their target is known before propagation.
    pub(crate) static_callsites: Vec<CallSite>,
    pub(crate) var_accesses: HashMap<VarId, VarAccesses>,
}

impl MethodPAG {
    pub fn new(method: MethodId) -> Self {
        MethodPAG {
            method,
            allocations: Vec::new(),
            copies: Vec::new(),
            static_loads: Vec::new(),
            static_stores: Vec::new(),
            static_callsites: Vec::new(),
            var_accesses: HashMap::new(),
        }
    }

    #[inline]
    pub fn method(&self) -> MethodId {
        self.method
    }

    pub fn add_allocation(&mut self, lhs: VarId, site: AllocSiteId) {
        self.allocations.push((lhs, site));
    }

    pub fn add_copy(&mut self, src: VarId, dst: VarId) {
        self.copies.push((src, dst));
    }

    pub fn add_static_load(&mut self, field: FieldId, lhs: VarId) {
        self.static_loads.push((field, lhs));
    }

    pub fn add_static_store(&mut self, rhs: VarId, field: FieldId) {
        self.static_stores.push((rhs, field));
    }

    pub fn add_static_callsite(&mut self, callsite: CallSite) {
        self.static_callsites.push(callsite);
    }

    fn accesses_mut(&mut self, var: VarId) -> &mut VarAccesses {
        self.var_accesses.entry(var).or_default()
    }

    pub fn add_store_field(&mut self, base: VarId, field: FieldId, rhs: VarId) {
        self.accesses_mut(base).store_fields.push((field, rhs));
    }

    pub fn add_load_field(&mut self, base: VarId, field: FieldId, lhs: VarId) {
        self.accesses_mut(base).load_fields.push((field, lhs));
    }

    pub fn add_store_array(&mut self, base: VarId, rhs: VarId) {
        self.accesses_mut(base).store_arrays.push(rhs);
    }

    pub fn add_load_array(&mut self, base: VarId, lhs: VarId) {
        self.accesses_mut(base).load_arrays.push(lhs);
    }

    pub fn add_instance_callsite(&mut self, recv: VarId, callsite: CallSite) {
        self.accesses_mut(recv).invokes.push(callsite);
    }

    /// The deferred statements based on `var`, if any.
    pub fn accesses_of(&self, var: VarId) -> Option<&VarAccesses> {
        self.var_accesses.get(&var)
    }
}
