// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result};
use std::hash::Hash;
use std::rc::Rc;

use super::call_site::CallSite;
use super::program::{ClassId, Program};
use crate::pta::heap_model::{HeapModel, ObjId};
use crate::util::index::{newtype_index, IndexVec};

newtype_index! {
    /// The unique identifier for each context.
    #[debug_format = "ContextId({})"]
    pub struct ContextId {}
}

pub trait ContextElement: Clone + Eq + PartialEq + Debug + Hash {
    /// A readable name of the element, used when dumping results.
    fn describe(&self, program: &Program, heap_model: &HeapModel) -> String;
}

/// A call string, receiver-object string or type string. The most recent
/// element comes first.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Context<E: ContextElement> {
    pub(crate) context_elems: Vec<E>,
}

impl<E: ContextElement> Debug for Context<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        self.context_elems.fmt(f)
    }
}

impl<E: ContextElement> Context<E> {
    pub fn new_empty() -> Rc<Self> {
        Rc::new(Context {
            context_elems: Vec::new(),
        })
    }

    pub fn new(context_elems: Vec<E>) -> Rc<Self> {
        Rc::new(Context { context_elems })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.context_elems.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.context_elems.is_empty()
    }

    /// Compose a new context from a given context and a new context element.
    /// Discard the last old context element if the length of context exceeds the depth limit
    pub fn new_k_limited_context(old_ctx: &Rc<Context<E>>, elem: E, k: usize) -> Rc<Self> {
        let mut elems = Vec::with_capacity(k);
        if k > 0 {
            elems.push(elem);
            if old_ctx.len() < k {
                elems.extend_from_slice(&old_ctx.context_elems[..])
            } else {
                elems.extend_from_slice(&old_ctx.context_elems[..k - 1])
            }
        }
        Rc::new(Context { context_elems: elems })
    }

    pub fn k_limited_context(ctx: &Rc<Context<E>>, k: usize) -> Rc<Self> {
        if ctx.len() <= k {
            ctx.clone()
        } else {
            let elems = ctx.context_elems[..k].to_vec();
            Rc::new(Context { context_elems: elems })
        }
    }

    pub fn elements(&self) -> &[E] {
        &self.context_elems
    }

    pub fn describe(&self, program: &Program, heap_model: &HeapModel) -> String {
        let elems = self
            .context_elems
            .iter()
            .map(|e| e.describe(program, heap_model))
            .collect::<Vec<_>>();
        format!("[{}]", elems.join(", "))
    }
}

/// Interns contexts so that equal contexts share one id.
#[derive(Debug)]
pub struct ContextCache<E: ContextElement> {
    context_list: IndexVec<ContextId, Rc<Context<E>>>,
    context_to_index_map: HashMap<Rc<Context<E>>, ContextId>,
}

impl<E: ContextElement> Default for ContextCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ContextElement> ContextCache<E> {
    /// Creates a cache whose first id is reserved for the empty context.
    pub fn new() -> ContextCache<E> {
        let mut cache = ContextCache {
            context_list: IndexVec::new(),
            context_to_index_map: HashMap::new(),
        };
        cache.get_context_id(&Context::new_empty());
        cache
    }

    pub fn empty_context_id(&self) -> ContextId {
        ContextId::from_usize(0)
    }

    pub fn get_context_id(&mut self, context: &Rc<Context<E>>) -> ContextId {
        if let Some(id) = self.context_to_index_map.get(context) {
            *id
        } else {
            let id = self.context_list.push(context.clone());
            self.context_to_index_map.insert(context.clone(), id);
            id
        }
    }

    /// Returns the context stored at this index, or None if the index is out
    /// of range.
    pub fn get_context(&self, id: ContextId) -> Option<Rc<Context<E>>> {
        self.context_list.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.context_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.context_list.is_empty()
    }
}

// Different kinds of context elements supported now
impl ContextElement for CallSite {
    fn describe(&self, program: &Program, _heap_model: &HeapModel) -> String {
        format!("{}[{}]", program.method_signature(self.method), self.stmt_index)
    }
}

impl ContextElement for ObjId {
    fn describe(&self, program: &Program, heap_model: &HeapModel) -> String {
        heap_model.obj_name(program, *self)
    }
}

impl ContextElement for ClassId {
    fn describe(&self, program: &Program, _heap_model: &HeapModel) -> String {
        program.class(*self).name.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn k_limited_prepends_and_truncates() {
        let empty = Context::<ClassId>::new_empty();
        let c1 = Context::new_k_limited_context(&empty, ClassId::from_usize(1), 2);
        let c2 = Context::new_k_limited_context(&c1, ClassId::from_usize(2), 2);
        let c3 = Context::new_k_limited_context(&c2, ClassId::from_usize(3), 2);
        assert_eq!(c2.elements(), &[ClassId::from_usize(2), ClassId::from_usize(1)]);
        assert_eq!(c3.elements(), &[ClassId::from_usize(3), ClassId::from_usize(2)]);
        assert_eq!(Context::k_limited_context(&c3, 1).elements(), &[ClassId::from_usize(3)]);
        assert!(Context::new_k_limited_context(&c3, ClassId::from_usize(4), 0).is_empty());
    }

    #[test]
    fn cache_interns_structurally() {
        let mut cache = ContextCache::<ClassId>::new();
        assert_eq!(cache.get_context_id(&Context::new_empty()), cache.empty_context_id());
        let a = cache.get_context_id(&Context::new(vec![ClassId::from_usize(7)]));
        let b = cache.get_context_id(&Context::new(vec![ClassId::from_usize(7)]));
        assert_eq!(a, b);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_context(a).unwrap().elements(), &[ClassId::from_usize(7)]);
    }
}
