// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Context strategies for context-sensitive pointer analyses.
//!
//! Every strategy owns the cache its contexts are interned in. Method contexts
//! and heap contexts share one cache, so an object's heap context can be
//! extended directly into the context of a method invoked on it.

use std::rc::Rc;

use crate::ir::call_site::CallSite;
use crate::ir::context::{Context, ContextCache, ContextElement, ContextId};
use crate::ir::program::{ClassId, MethodId};
use crate::pta::heap_model::{CSObj, Obj, ObjId};

pub trait ContextStrategy {
    type E: ContextElement;

    fn empty_context(&self) -> Rc<Context<Self::E>> {
        Context::new_empty()
    }
    fn get_empty_context_id(&mut self) -> ContextId;
    fn get_context_id(&mut self, context: &Rc<Context<Self::E>>) -> ContextId;
    fn get_context_by_id(&self, context_id: ContextId) -> Rc<Context<Self::E>>;
    /// Number of distinct contexts created so far.
    fn num_contexts(&self) -> usize;

    /// Context of a method invoked without a receiver.
    fn new_static_call_context(&mut self, caller_cid: ContextId, callsite: CallSite, callee: MethodId) -> ContextId;

    /// Context of a method dispatched on the receiver object `recv`.
    fn new_instance_call_context(
        &mut self,
        caller_cid: ContextId,
        callsite: CallSite,
        recv: CSObj,
        recv_obj: &Obj,
        callee: MethodId,
    ) -> ContextId;

    /// Heap context of an object allocated in a method analyzed under `method_cid`.
    fn new_heap_context(&mut self, method_cid: ContextId, obj: ObjId) -> ContextId;
}

/// Analyzes every method under the single empty context.
#[derive(Debug, Default)]
pub struct ContextInsensitive {
    ctx_cache: ContextCache<CallSite>,
}

impl ContextInsensitive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContextStrategy for ContextInsensitive {
    type E = CallSite;

    fn get_empty_context_id(&mut self) -> ContextId {
        self.ctx_cache.empty_context_id()
    }

    fn get_context_id(&mut self, _context: &Rc<Context<CallSite>>) -> ContextId {
        self.ctx_cache.empty_context_id()
    }

    fn get_context_by_id(&self, _context_id: ContextId) -> Rc<Context<CallSite>> {
        self.empty_context()
    }

    fn num_contexts(&self) -> usize {
        1
    }

    fn new_static_call_context(&mut self, _caller_cid: ContextId, _callsite: CallSite, _callee: MethodId) -> ContextId {
        self.ctx_cache.empty_context_id()
    }

    fn new_instance_call_context(
        &mut self,
        _caller_cid: ContextId,
        _callsite: CallSite,
        _recv: CSObj,
        _recv_obj: &Obj,
        _callee: MethodId,
    ) -> ContextId {
        self.ctx_cache.empty_context_id()
    }

    fn new_heap_context(&mut self, _method_cid: ContextId, _obj: ObjId) -> ContextId {
        self.ctx_cache.empty_context_id()
    }
}

/// Truncates `cid` to `k` elements and interns the result.
fn truncate<E: ContextElement>(ctx_cache: &mut ContextCache<E>, cid: ContextId, k: usize) -> ContextId {
    let ctx = ctx_cache.get_context(cid).unwrap_or_else(Context::new_empty);
    let heap_ctx = Context::k_limited_context(&ctx, k);
    ctx_cache.get_context_id(&heap_ctx)
}

/// Prepends `elem` to the context `cid`, keeping at most `k` elements.
fn extend<E: ContextElement>(ctx_cache: &mut ContextCache<E>, cid: ContextId, elem: E, k: usize) -> ContextId {
    let ctx = ctx_cache.get_context(cid).unwrap_or_else(Context::new_empty);
    let new_ctx = Context::new_k_limited_context(&ctx, elem, k);
    ctx_cache.get_context_id(&new_ctx)
}

/// Call-string sensitivity: a callee context is the call site followed by
/// the caller context.
pub struct KCallSiteSensitive {
    /// Context length limit for methods
    k: usize,
    /// Context length limit for heap objects
    heap_k: usize,
    pub(crate) ctx_cache: ContextCache<CallSite>,
}

impl KCallSiteSensitive {
    pub fn new(k: usize, heap_k: usize) -> Self {
        Self {
            k,
            heap_k,
            ctx_cache: ContextCache::new(),
        }
    }
}

impl ContextStrategy for KCallSiteSensitive {
    type E = CallSite;

    fn get_empty_context_id(&mut self) -> ContextId {
        self.ctx_cache.empty_context_id()
    }

    fn get_context_id(&mut self, context: &Rc<Context<CallSite>>) -> ContextId {
        self.ctx_cache.get_context_id(context)
    }

    fn get_context_by_id(&self, context_id: ContextId) -> Rc<Context<CallSite>> {
        self.ctx_cache.get_context(context_id).unwrap_or_else(Context::new_empty)
    }

    fn num_contexts(&self) -> usize {
        self.ctx_cache.len()
    }

    fn new_static_call_context(&mut self, caller_cid: ContextId, callsite: CallSite, _callee: MethodId) -> ContextId {
        extend(&mut self.ctx_cache, caller_cid, callsite, self.k)
    }

    fn new_instance_call_context(
        &mut self,
        caller_cid: ContextId,
        callsite: CallSite,
        _recv: CSObj,
        _recv_obj: &Obj,
        _callee: MethodId,
    ) -> ContextId {
        extend(&mut self.ctx_cache, caller_cid, callsite, self.k)
    }

    fn new_heap_context(&mut self, method_cid: ContextId, _obj: ObjId) -> ContextId {
        truncate(&mut self.ctx_cache, method_cid, self.heap_k)
    }
}

/// Object sensitivity: a callee context is the receiver object followed by
/// the receiver's heap context. Static calls keep the caller's context.
pub struct KObjectSensitive {
    /// Context length limit for methods
    k: usize,
    /// Context length limit for heap objects
    heap_k: usize,
    pub(crate) ctx_cache: ContextCache<ObjId>,
}

impl KObjectSensitive {
    pub fn new(k: usize, heap_k: usize) -> Self {
        Self {
            k,
            heap_k,
            ctx_cache: ContextCache::new(),
        }
    }
}

impl ContextStrategy for KObjectSensitive {
    type E = ObjId;

    fn get_empty_context_id(&mut self) -> ContextId {
        self.ctx_cache.empty_context_id()
    }

    fn get_context_id(&mut self, context: &Rc<Context<ObjId>>) -> ContextId {
        self.ctx_cache.get_context_id(context)
    }

    fn get_context_by_id(&self, context_id: ContextId) -> Rc<Context<ObjId>> {
        self.ctx_cache.get_context(context_id).unwrap_or_else(Context::new_empty)
    }

    fn num_contexts(&self) -> usize {
        self.ctx_cache.len()
    }

    fn new_static_call_context(&mut self, caller_cid: ContextId, _callsite: CallSite, _callee: MethodId) -> ContextId {
        // use the same context as the caller method
        caller_cid
    }

    fn new_instance_call_context(
        &mut self,
        _caller_cid: ContextId,
        _callsite: CallSite,
        recv: CSObj,
        _recv_obj: &Obj,
        _callee: MethodId,
    ) -> ContextId {
        extend(&mut self.ctx_cache, recv.cid, recv.obj, self.k)
    }

    fn new_heap_context(&mut self, method_cid: ContextId, _obj: ObjId) -> ContextId {
        truncate(&mut self.ctx_cache, method_cid, self.heap_k)
    }
}

/// Type sensitivity: like object sensitivity, but each receiver object is
/// replaced by the class containing its allocation site.
pub struct KTypeSensitive {
    /// Context length limit for methods
    k: usize,
    /// Context length limit for heap objects
    heap_k: usize,
    pub(crate) ctx_cache: ContextCache<ClassId>,
}

impl KTypeSensitive {
    pub fn new(k: usize, heap_k: usize) -> Self {
        Self {
            k,
            heap_k,
            ctx_cache: ContextCache::new(),
        }
    }
}

impl ContextStrategy for KTypeSensitive {
    type E = ClassId;

    fn get_empty_context_id(&mut self) -> ContextId {
        self.ctx_cache.empty_context_id()
    }

    fn get_context_id(&mut self, context: &Rc<Context<ClassId>>) -> ContextId {
        self.ctx_cache.get_context_id(context)
    }

    fn get_context_by_id(&self, context_id: ContextId) -> Rc<Context<ClassId>> {
        self.ctx_cache.get_context(context_id).unwrap_or_else(Context::new_empty)
    }

    fn num_contexts(&self) -> usize {
        self.ctx_cache.len()
    }

    fn new_static_call_context(&mut self, caller_cid: ContextId, _callsite: CallSite, _callee: MethodId) -> ContextId {
        caller_cid
    }

    fn new_instance_call_context(
        &mut self,
        _caller_cid: ContextId,
        _callsite: CallSite,
        recv: CSObj,
        recv_obj: &Obj,
        _callee: MethodId,
    ) -> ContextId {
        extend(&mut self.ctx_cache, recv.cid, recv_obj.container, self.k)
    }

    fn new_heap_context(&mut self, method_cid: ContextId, _obj: ObjId) -> ContextId {
        truncate(&mut self.ctx_cache, method_cid, self.heap_k)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::program::AllocSiteId;
    use crate::ir::program::JType;

    fn callsite(m: usize, i: usize) -> CallSite {
        CallSite::new(MethodId::from_usize(m), i)
    }

    fn obj(container: usize) -> Obj {
        Obj {
            ty: JType::Array("int[]".to_string()),
            site: AllocSiteId::from_usize(0),
            alloc_method: MethodId::from_usize(0),
            container: ClassId::from_usize(container),
        }
    }

    #[test]
    fn call_site_contexts_are_k_limited() {
        let mut strategy = KCallSiteSensitive::new(2, 1);
        let m = MethodId::from_usize(9);
        let empty = strategy.get_empty_context_id();
        let c1 = strategy.new_static_call_context(empty, callsite(0, 1), m);
        let c2 = strategy.new_static_call_context(c1, callsite(1, 2), m);
        let c3 = strategy.new_static_call_context(c2, callsite(2, 3), m);
        assert_eq!(
            strategy.get_context_by_id(c3).elements(),
            &[callsite(2, 3), callsite(1, 2)]
        );
        // The same call string is interned once.
        assert_eq!(strategy.new_static_call_context(empty, callsite(0, 1), m), c1);
        let heap = strategy.new_heap_context(c3, ObjId::from_usize(0));
        assert_eq!(strategy.get_context_by_id(heap).elements(), &[callsite(2, 3)]);
    }

    #[test]
    fn object_contexts_follow_the_receiver() {
        let mut strategy = KObjectSensitive::new(1, 0);
        let empty = strategy.get_empty_context_id();
        let m = MethodId::from_usize(0);
        let recv = CSObj { cid: empty, obj: ObjId::from_usize(4) };
        let c1 = strategy.new_instance_call_context(empty, callsite(0, 0), recv, &obj(0), m);
        assert_eq!(strategy.get_context_by_id(c1).elements(), &[ObjId::from_usize(4)]);
        assert_eq!(strategy.new_static_call_context(c1, callsite(0, 1), m), c1);
        assert_eq!(strategy.new_heap_context(c1, ObjId::from_usize(5)), empty);
    }

    #[test]
    fn type_contexts_use_the_allocating_class() {
        let mut strategy = KTypeSensitive::new(2, 1);
        let empty = strategy.get_empty_context_id();
        let m = MethodId::from_usize(0);
        let recv = CSObj { cid: empty, obj: ObjId::from_usize(4) };
        let c1 = strategy.new_instance_call_context(empty, callsite(0, 0), recv, &obj(3), m);
        assert_eq!(strategy.get_context_by_id(c1).elements(), &[ClassId::from_usize(3)]);
    }

    #[test]
    fn insensitive_strategy_has_one_context() {
        let mut strategy = ContextInsensitive::new();
        let empty = strategy.get_empty_context_id();
        let m = MethodId::from_usize(0);
        assert_eq!(strategy.new_static_call_context(empty, callsite(0, 0), m), empty);
        assert_eq!(strategy.new_heap_context(empty, ObjId::from_usize(1)), empty);
        assert_eq!(strategy.num_contexts(), 1);
    }
}
