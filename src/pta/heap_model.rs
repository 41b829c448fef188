// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Abstraction of heap allocations into a finite set of objects.

use std::collections::HashMap;

use crate::ir::context::ContextId;
use crate::ir::program::{AllocSiteId, ClassId, JType, MethodId, Program};
use crate::util::index::{newtype_index, IndexVec};

newtype_index! {
    /// The unique identifier for each abstract object.
    #[debug_format = "ObjId({})"]
    pub struct ObjId {}
}

newtype_index! {
    /// The unique identifier for each abstract object under a heap context.
    #[debug_format = "CSObjId({})"]
    pub struct CSObjId {}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeapModelKind {
    /// One object per allocation site.
    AllocSite,
    /// One object per allocated type.
    Type,
}

#[derive(Debug)]
pub struct Obj {
    pub ty: JType,
    /// The allocation site represented by this object. Under the type-based
    /// heap model it is the first site seen for the type and container.
    pub site: AllocSiteId,
    /// The method containing the allocation site.
    pub alloc_method: MethodId,
    /// The class declaring `alloc_method`, used as a type-sensitive context
    /// element. Identical for every site merged into one type object.
    pub container: ClassId,
}

#[derive(Debug)]
pub struct HeapModel {
    kind: HeapModelKind,
    objs: IndexVec<ObjId, Obj>,
    site_objs: HashMap<AllocSiteId, ObjId>,
    /// Type objects, one per allocated type and allocating class.
    type_objs: HashMap<(JType, ClassId), ObjId>,
}

impl HeapModel {
    pub fn new(kind: HeapModelKind) -> Self {
        HeapModel {
            kind,
            objs: IndexVec::new(),
            site_objs: HashMap::new(),
            type_objs: HashMap::new(),
        }
    }

    /// Returns the abstract object representing allocations at `site`.
    pub fn get_obj(&mut self, program: &Program, site: AllocSiteId) -> ObjId {
        if let Some(obj) = self.site_objs.get(&site) {
            return *obj;
        }
        let alloc = program.alloc_site(site);
        let container = program.method(alloc.method).class;
        let type_key = (alloc.ty.clone(), container);
        let obj = match self.type_objs.get(&type_key) {
            Some(obj) if self.kind == HeapModelKind::Type => *obj,
            _ => {
                let obj = self.objs.push(Obj {
                    ty: alloc.ty.clone(),
                    site,
                    alloc_method: alloc.method,
                    container,
                });
                if self.kind == HeapModelKind::Type {
                    self.type_objs.insert(type_key, obj);
                }
                obj
            }
        };
        self.site_objs.insert(site, obj);
        obj
    }

    #[inline]
    pub fn obj(&self, id: ObjId) -> &Obj {
        &self.objs[id]
    }

    pub fn num_objs(&self) -> usize {
        self.objs.len()
    }

    pub fn obj_name(&self, program: &Program, id: ObjId) -> String {
        let obj = self.obj(id);
        match self.kind {
            HeapModelKind::AllocSite => program.alloc_site_name(obj.site),
            HeapModelKind::Type => format!(
                "TypeObj{{{}: new {}}}",
                program.class(obj.container).name,
                program.type_name(&obj.ty)
            ),
        }
    }
}

/// An abstract object qualified by a heap context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CSObj {
    pub cid: ContextId,
    pub obj: ObjId,
}

/// Interns context-sensitive objects into dense ids that points-to sets can
/// store as bits.
#[derive(Debug, Default)]
pub struct CSObjCache {
    objs: IndexVec<CSObjId, CSObj>,
    obj_to_index_map: HashMap<CSObj, CSObjId>,
}

impl CSObjCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_cs_obj_id(&mut self, cid: ContextId, obj: ObjId) -> CSObjId {
        let cs_obj = CSObj { cid, obj };
        if let Some(id) = self.obj_to_index_map.get(&cs_obj) {
            *id
        } else {
            let id = self.objs.push(cs_obj);
            self.obj_to_index_map.insert(cs_obj, id);
            id
        }
    }

    #[inline]
    pub fn cs_obj(&self, id: CSObjId) -> CSObj {
        self.objs[id]
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PROGRAM: &str = r#"{
        "classes": [
            {"name": "A"},
            {"name": "Main", "methods": [
                {"name": "main", "static": true, "body": [
                    {"kind": "new", "lhs": "a", "type": "A"},
                    {"kind": "new", "lhs": "b", "type": "A"},
                    {"kind": "new", "lhs": "c", "type": "A[]"}
                ]}
            ]}
        ],
        "entry": {"class": "Main", "method": "main/0"}
    }"#;

    fn sites(program: &Program) -> Vec<AllocSiteId> {
        program.alloc_sites.iter_enumerated().map(|(id, _)| id).collect()
    }

    #[test]
    fn alloc_site_model_separates_sites() {
        let program = Program::from_json_str(PROGRAM).unwrap();
        let mut heap = HeapModel::new(HeapModelKind::AllocSite);
        let objs = sites(&program)
            .into_iter()
            .map(|s| heap.get_obj(&program, s))
            .collect::<Vec<_>>();
        assert_eq!(heap.num_objs(), 3);
        assert_ne!(objs[0], objs[1]);
        assert_eq!(heap.get_obj(&program, sites(&program)[0]), objs[0]);
        assert_eq!(heap.obj(objs[2]).container, program.class_by_name("Main").unwrap());
    }

    #[test]
    fn type_model_merges_sites_of_one_type() {
        let program = Program::from_json_str(PROGRAM).unwrap();
        let mut heap = HeapModel::new(HeapModelKind::Type);
        let objs = sites(&program)
            .into_iter()
            .map(|s| heap.get_obj(&program, s))
            .collect::<Vec<_>>();
        assert_eq!(objs[0], objs[1]);
        assert_ne!(objs[0], objs[2]);
        assert_eq!(heap.obj_name(&program, objs[0]), "TypeObj{Main: new A}");
    }

    #[test]
    fn type_model_keeps_allocating_classes_apart() {
        let program = Program::from_json_str(
            r#"{
            "classes": [
                {"name": "A"},
                {"name": "Factory", "methods": [
                    {"name": "make", "static": true, "body": [
                        {"kind": "new", "lhs": "a", "type": "A"},
                        {"kind": "return", "var": "a"}
                    ]}
                ]},
                {"name": "Main", "methods": [
                    {"name": "main", "static": true, "body": [
                        {"kind": "new", "lhs": "a", "type": "A"},
                        {"kind": "new", "lhs": "b", "type": "A"}
                    ]}
                ]}
            ],
            "entry": {"class": "Main", "method": "main/0"}
        }"#,
        )
        .unwrap();
        let (factory, main1, main2) = (sites(&program)[0], sites(&program)[1], sites(&program)[2]);
        // The object, and with it the type context element, is the same
        // whichever site is seen first.
        for order in [[factory, main1, main2], [main2, main1, factory]] {
            let mut heap = HeapModel::new(HeapModelKind::Type);
            for site in order {
                heap.get_obj(&program, site);
            }
            let in_main = heap.get_obj(&program, main1);
            let in_factory = heap.get_obj(&program, factory);
            assert_eq!(heap.get_obj(&program, main2), in_main);
            assert_ne!(in_main, in_factory);
            assert_eq!(heap.obj(in_main).container, program.class_by_name("Main").unwrap());
            assert_eq!(heap.obj(in_factory).container, program.class_by_name("Factory").unwrap());
        }
    }

    #[test]
    fn cs_objs_are_interned() {
        let mut cache = CSObjCache::new();
        let cid = ContextId::from_usize(0);
        let a = cache.get_cs_obj_id(cid, ObjId::from_usize(3));
        assert_eq!(cache.get_cs_obj_id(cid, ObjId::from_usize(3)), a);
        assert_ne!(cache.get_cs_obj_id(ContextId::from_usize(1), ObjId::from_usize(3)), a);
        assert_eq!(cache.cs_obj(a).obj, ObjId::from_usize(3));
        assert_eq!(cache.len(), 2);
    }
}
