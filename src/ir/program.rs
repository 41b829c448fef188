// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The whole-program model the analyses run on: classes, fields, methods,
//! variables and allocation sites, all interned into dense ids.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;

use super::stmt::{MethodRef, Stmt};
use crate::util::index::{newtype_index, IndexVec};

newtype_index! {
    /// The unique identifier for each class or interface.
    #[debug_format = "ClassId({})"]
    pub struct ClassId {}
}

newtype_index! {
    /// The unique identifier for each declared field.
    #[debug_format = "FieldId({})"]
    pub struct FieldId {}
}

newtype_index! {
    /// The unique identifier for each declared method.
    #[debug_format = "MethodId({})"]
    pub struct MethodId {}
}

newtype_index! {
    /// The unique identifier for each local variable. Variables of different
    /// methods never share an id.
    #[debug_format = "VarId({})"]
    pub struct VarId {}
}

newtype_index! {
    /// The unique identifier for each allocation statement.
    #[debug_format = "AllocSiteId({})"]
    pub struct AllocSiteId {}
}

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub super_class: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub is_interface: bool,
    pub is_abstract: bool,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
}

#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub class: ClassId,
    pub is_static: bool,
}

#[derive(Debug)]
pub struct Method {
    pub name: String,
    pub subsignature: String,
    pub class: ClassId,
    pub is_static: bool,
    pub is_abstract: bool,
    pub params: Vec<VarId>,
    pub this_var: Option<VarId>,
    pub return_vars: Vec<VarId>,
    /// Every variable of the method, in declaration order.
    pub locals: Vec<VarId>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub struct Var {
    pub name: String,
    pub method: MethodId,
}

/// Types that can be allocated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JType {
    Class(ClassId),
    /// An array type, kept by its textual name (e.g. `int[]`).
    Array(String),
}

#[derive(Debug)]
pub struct AllocSite {
    pub method: MethodId,
    pub stmt_index: usize,
    pub ty: JType,
}

#[derive(Debug)]
pub struct Program {
    pub classes: IndexVec<ClassId, Class>,
    pub fields: IndexVec<FieldId, Field>,
    pub methods: IndexVec<MethodId, Method>,
    pub vars: IndexVec<VarId, Var>,
    pub alloc_sites: IndexVec<AllocSiteId, AllocSite>,
    pub(crate) class_by_name: HashMap<String, ClassId>,
    pub entry: MethodId,
}

impl Program {
    /// Loads a program from its JSON description.
    pub fn from_json_str(json: &str) -> anyhow::Result<Program> {
        let desc: super::loader::ProgramDesc =
            serde_json::from_str(json).context("malformed program description")?;
        super::loader::load_program(desc)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Program> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("failed to load {}", path.display()))
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id]
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id]
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id]
    }

    #[inline]
    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id]
    }

    #[inline]
    pub fn alloc_site(&self, id: AllocSiteId) -> &AllocSite {
        &self.alloc_sites[id]
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    /// Looks up a method declared directly in the class named `class`.
    pub fn find_method(&self, class: &str, subsignature: &str) -> Option<MethodId> {
        let class = self.class_by_name(class)?;
        self.class(class)
            .methods
            .iter()
            .copied()
            .find(|m| self.method(*m).subsignature == subsignature)
    }

    /// Looks up a variable of `method` by its source name.
    pub fn find_var(&self, method: MethodId, name: &str) -> Option<VarId> {
        self.method_locals(method).find(|v| self.var(*v).name == name)
    }

    /// Every variable declared by `method`.
    pub fn method_locals(&self, method: MethodId) -> impl Iterator<Item = VarId> + '_ {
        self.method(method).locals.iter().copied()
    }

    pub fn type_name(&self, ty: &JType) -> String {
        match ty {
            JType::Class(class) => self.class(*class).name.clone(),
            JType::Array(name) => name.clone(),
        }
    }

    /// `<C: subsig>`
    pub fn method_signature(&self, id: MethodId) -> String {
        let method = self.method(id);
        format!("<{}: {}>", self.class(method.class).name, method.subsignature)
    }

    /// `<C: subsig>` for a possibly unresolved method reference.
    pub fn method_ref_name(&self, method_ref: &MethodRef) -> String {
        format!("<{}: {}>", self.class(method_ref.class).name, method_ref.subsignature)
    }

    /// `<C: f>`
    pub fn field_signature(&self, id: FieldId) -> String {
        let field = self.field(id);
        format!("<{}: {}>", self.class(field.class).name, field.name)
    }

    /// `<C: subsig>/x`
    pub fn var_name(&self, id: VarId) -> String {
        let var = self.var(id);
        format!("{}/{}", self.method_signature(var.method), var.name)
    }

    /// `NewObj{<C: subsig>[3]: new T}`
    pub fn alloc_site_name(&self, id: AllocSiteId) -> String {
        let site = self.alloc_site(id);
        format!(
            "NewObj{{{}[{}]: new {}}}",
            self.method_signature(site.method),
            site.stmt_index,
            self.type_name(&site.ty)
        )
    }
}
