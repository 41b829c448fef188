// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Class hierarchy queries over a loaded program.
//!
//! The hierarchy keeps the reverse edges (subclasses, subinterfaces and
//! implementors) that the program itself does not store, and answers method
//! lookup in the way the virtual machine performs it.

use std::collections::HashMap;

use super::program::{ClassId, JType, MethodId, Program};
use super::stmt::MethodRef;

const ROOT_CLASS_NAMES: [&str; 2] = ["java.lang.Object", "Object"];

#[derive(Debug)]
pub struct ClassHierarchy {
    direct_subclasses: HashMap<ClassId, Vec<ClassId>>,
    direct_subinterfaces: HashMap<ClassId, Vec<ClassId>>,
    direct_implementors: HashMap<ClassId, Vec<ClassId>>,
    /// Methods declared directly in each class, keyed by subsignature.
    declared_methods: HashMap<(ClassId, String), MethodId>,
    root_class: Option<ClassId>,
}

impl ClassHierarchy {
    pub fn new(program: &Program) -> Self {
        let mut direct_subclasses: HashMap<ClassId, Vec<ClassId>> = HashMap::new();
        let mut direct_subinterfaces: HashMap<ClassId, Vec<ClassId>> = HashMap::new();
        let mut direct_implementors: HashMap<ClassId, Vec<ClassId>> = HashMap::new();
        let mut declared_methods = HashMap::new();

        for (id, class) in program.classes.iter_enumerated() {
            if let Some(super_class) = class.super_class {
                direct_subclasses.entry(super_class).or_default().push(id);
            }
            for iface in &class.interfaces {
                if class.is_interface {
                    direct_subinterfaces.entry(*iface).or_default().push(id);
                } else {
                    direct_implementors.entry(*iface).or_default().push(id);
                }
            }
            for method in &class.methods {
                declared_methods.insert((id, program.method(*method).subsignature.clone()), *method);
            }
        }

        let root_class = ROOT_CLASS_NAMES
            .iter()
            .find_map(|name| program.class_by_name(name));

        ClassHierarchy {
            direct_subclasses,
            direct_subinterfaces,
            direct_implementors,
            declared_methods,
            root_class,
        }
    }

    pub fn direct_subclasses_of(&self, class: ClassId) -> &[ClassId] {
        self.direct_subclasses.get(&class).map_or(&[], |v| v.as_slice())
    }

    pub fn direct_subinterfaces_of(&self, class: ClassId) -> &[ClassId] {
        self.direct_subinterfaces.get(&class).map_or(&[], |v| v.as_slice())
    }

    pub fn direct_implementors_of(&self, class: ClassId) -> &[ClassId] {
        self.direct_implementors.get(&class).map_or(&[], |v| v.as_slice())
    }

    /// The method with `subsignature` declared directly in `class`, abstract or not.
    pub fn declared_method(&self, class: ClassId, subsignature: &str) -> Option<MethodId> {
        self.declared_methods
            .get(&(class, subsignature.to_string()))
            .copied()
    }

    /// The class used to dispatch calls on array objects.
    pub fn root_class(&self) -> Option<ClassId> {
        self.root_class
    }

    /// Looks up the target method starting from `class` and walking up the
    /// superclass chain. Returns the first non-abstract method matching
    /// `subsignature`, or None if there is none.
    pub fn dispatch(&self, program: &Program, class: ClassId, subsignature: &str) -> Option<MethodId> {
        let mut cur = Some(class);
        while let Some(c) = cur {
            if let Some(method) = self.declared_method(c, subsignature) {
                if !program.method(method).is_abstract {
                    return Some(method);
                }
            }
            cur = program.class(c).super_class;
        }
        None
    }

    /// Dispatches on the runtime type of an abstract object.
    pub fn dispatch_on_type(&self, program: &Program, ty: &JType, subsignature: &str) -> Option<MethodId> {
        match ty {
            JType::Class(class) => self.dispatch(program, *class, subsignature),
            JType::Array(_) => self.dispatch(program, self.root_class?, subsignature),
        }
    }

    /// Resolves a method reference to its declaration, searching superclasses
    /// and then superinterfaces. The result may be abstract.
    pub fn resolve_method_ref(&self, program: &Program, method_ref: &MethodRef) -> Option<MethodId> {
        let mut cur = Some(method_ref.class);
        while let Some(c) = cur {
            if let Some(method) = self.declared_method(c, &method_ref.subsignature) {
                return Some(method);
            }
            cur = program.class(c).super_class;
        }
        let mut worklist = vec![method_ref.class];
        let mut visited = Vec::new();
        while let Some(c) = worklist.pop() {
            if visited.contains(&c) {
                continue;
            }
            visited.push(c);
            if let Some(method) = self.declared_method(c, &method_ref.subsignature) {
                return Some(method);
            }
            let class = program.class(c);
            worklist.extend(class.interfaces.iter().copied());
            worklist.extend(class.super_class);
        }
        None
    }

    /// Returns true if `sub` is `sup` or inherits from it through superclasses
    /// or implemented interfaces.
    pub fn is_subclass(&self, program: &Program, sub: ClassId, sup: ClassId) -> bool {
        let mut worklist = vec![sub];
        let mut visited = Vec::new();
        while let Some(c) = worklist.pop() {
            if c == sup {
                return true;
            }
            if visited.contains(&c) {
                continue;
            }
            visited.push(c);
            let class = program.class(c);
            worklist.extend(class.interfaces.iter().copied());
            worklist.extend(class.super_class);
        }
        false
    }
}
