// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Builds a [`Program`] from its serialized description.
//!
//! Loading runs in three passes: class names are interned first so that
//! supertypes may be declared in any order, then members are interned, and
//! finally method bodies are lowered with every class, field and method id
//! already known.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context as _};
use log::*;
use serde::Deserialize;

use super::program::*;
use super::stmt::{CallKind, InvokeExp, MethodRef, Stmt};
use crate::util::index::IndexVec;

#[derive(Debug, Deserialize)]
pub struct ProgramDesc {
    pub classes: Vec<ClassDesc>,
    pub entry: MethodRefDesc,
}

#[derive(Debug, Deserialize)]
pub struct ClassDesc {
    pub name: String,
    #[serde(rename = "super", default)]
    pub super_class: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(rename = "interface", default)]
    pub is_interface: bool,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub fields: Vec<FieldDesc>,
    #[serde(default)]
    pub methods: Vec<MethodDesc>,
}

#[derive(Debug, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    #[serde(rename = "static", default)]
    pub is_static: bool,
}

#[derive(Debug, Deserialize)]
pub struct MethodDesc {
    pub name: String,
    #[serde(default)]
    pub subsignature: Option<String>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub body: Vec<StmtDesc>,
}

impl MethodDesc {
    fn subsignature(&self) -> String {
        match &self.subsignature {
            Some(subsig) => subsig.clone(),
            None => format!("{}/{}", self.name, self.params.len()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MethodRefDesc {
    pub class: String,
    pub method: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StmtDesc {
    New {
        lhs: String,
        #[serde(rename = "type")]
        ty: String,
    },
    Copy {
        lhs: String,
        rhs: String,
    },
    Load {
        lhs: String,
        base: Option<String>,
        field: String,
    },
    Store {
        base: Option<String>,
        field: String,
        rhs: String,
    },
    LoadArray {
        lhs: String,
        base: String,
    },
    StoreArray {
        base: String,
        rhs: String,
    },
    Invoke {
        call: CallKind,
        class: String,
        method: String,
        receiver: Option<String>,
        #[serde(default)]
        args: Vec<String>,
        result: Option<String>,
    },
    Return {
        var: Option<String>,
    },
    Nop,
}

const THIS_VAR: &str = "this";

struct Loader {
    classes: IndexVec<ClassId, Class>,
    fields: IndexVec<FieldId, Field>,
    methods: IndexVec<MethodId, Method>,
    vars: IndexVec<VarId, Var>,
    alloc_sites: IndexVec<AllocSiteId, AllocSite>,
    class_by_name: HashMap<String, ClassId>,
}

/// Variables of the method currently being lowered.
struct VarScope {
    method: MethodId,
    vars: HashMap<String, VarId>,
}

pub fn load_program(desc: ProgramDesc) -> anyhow::Result<Program> {
    let mut loader = Loader {
        classes: IndexVec::new(),
        fields: IndexVec::new(),
        methods: IndexVec::new(),
        vars: IndexVec::new(),
        alloc_sites: IndexVec::new(),
        class_by_name: HashMap::new(),
    };

    for class_desc in &desc.classes {
        loader.declare_class(class_desc)?;
    }
    let mut method_ids = Vec::with_capacity(desc.classes.len());
    for class_desc in &desc.classes {
        method_ids.push(loader.declare_members(class_desc)?);
    }
    loader.check_supertypes()?;
    for (class_desc, methods) in desc.classes.iter().zip(method_ids) {
        for (method_desc, method_id) in class_desc.methods.iter().zip(methods) {
            loader
                .lower_body(method_id, method_desc)
                .with_context(|| format!("in method {}.{}", class_desc.name, method_desc.name))?;
        }
    }

    let entry_class = loader.lookup_class(&desc.entry.class)?;
    let entry = loader.classes[entry_class]
        .methods
        .iter()
        .copied()
        .find(|m| loader.methods[*m].subsignature == desc.entry.method)
        .ok_or_else(|| {
            anyhow!(
                "entry method {}::{} is not declared",
                desc.entry.class,
                desc.entry.method
            )
        })?;
    if loader.methods[entry].is_abstract {
        bail!("entry method {}::{} is abstract", desc.entry.class, desc.entry.method);
    }

    debug!(
        "Loaded {} classes, {} methods, {} variables, {} allocation sites",
        loader.classes.len(),
        loader.methods.len(),
        loader.vars.len(),
        loader.alloc_sites.len()
    );
    Ok(Program {
        classes: loader.classes,
        fields: loader.fields,
        methods: loader.methods,
        vars: loader.vars,
        alloc_sites: loader.alloc_sites,
        class_by_name: loader.class_by_name,
        entry,
    })
}

impl Loader {
    fn declare_class(&mut self, desc: &ClassDesc) -> anyhow::Result<()> {
        if self.class_by_name.contains_key(&desc.name) {
            bail!("class {} is declared twice", desc.name);
        }
        let id = self.classes.push(Class {
            name: desc.name.clone(),
            super_class: None,
            interfaces: Vec::new(),
            is_interface: desc.is_interface,
            is_abstract: desc.is_abstract || desc.is_interface,
            fields: Vec::new(),
            methods: Vec::new(),
        });
        self.class_by_name.insert(desc.name.clone(), id);
        Ok(())
    }

    fn lookup_class(&self, name: &str) -> anyhow::Result<ClassId> {
        self.class_by_name
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown class {}", name))
    }

    fn declare_members(&mut self, desc: &ClassDesc) -> anyhow::Result<Vec<MethodId>> {
        let class = self.lookup_class(&desc.name)?;
        let super_class = match &desc.super_class {
            Some(name) => Some(self.lookup_class(name)?),
            None => None,
        };
        let interfaces = desc
            .interfaces
            .iter()
            .map(|name| self.lookup_class(name))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut fields = Vec::with_capacity(desc.fields.len());
        for field_desc in &desc.fields {
            fields.push(self.fields.push(Field {
                name: field_desc.name.clone(),
                class,
                is_static: field_desc.is_static,
            }));
        }

        let mut methods = Vec::with_capacity(desc.methods.len());
        for method_desc in &desc.methods {
            let subsignature = method_desc.subsignature();
            if methods
                .iter()
                .any(|m: &MethodId| self.methods[*m].subsignature == subsignature)
            {
                bail!("method {} is declared twice in class {}", subsignature, desc.name);
            }
            if method_desc.is_abstract && !method_desc.body.is_empty() {
                bail!("abstract method {}.{} has a body", desc.name, subsignature);
            }
            methods.push(self.methods.push(Method {
                name: method_desc.name.clone(),
                subsignature,
                class,
                is_static: method_desc.is_static,
                is_abstract: method_desc.is_abstract,
                params: Vec::new(),
                this_var: None,
                return_vars: Vec::new(),
                locals: Vec::new(),
                body: Vec::new(),
            }));
        }

        let class_ref = &mut self.classes[class];
        class_ref.super_class = super_class;
        class_ref.interfaces = interfaces;
        class_ref.fields = fields;
        class_ref.methods = methods.clone();
        Ok(methods)
    }

    /// Rejects cycles through superclasses or superinterfaces. Every walk
    /// over the hierarchy relies on it being acyclic.
    fn check_supertypes(&self) -> anyhow::Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }
        let mut marks = vec![Mark::Unvisited; self.classes.len()];
        for (root, _) in self.classes.iter_enumerated() {
            if marks[root.as_usize()] != Mark::Unvisited {
                continue;
            }
            // Each frame holds a class and the index of its next supertype.
            let mut stack = vec![(root, 0)];
            marks[root.as_usize()] = Mark::OnStack;
            while let Some((class, next)) = stack.pop() {
                let class_ref = &self.classes[class];
                let supertype = class_ref
                    .super_class
                    .into_iter()
                    .chain(class_ref.interfaces.iter().copied())
                    .nth(next);
                let supertype = match supertype {
                    Some(supertype) => supertype,
                    None => {
                        marks[class.as_usize()] = Mark::Done;
                        continue;
                    }
                };
                stack.push((class, next + 1));
                match marks[supertype.as_usize()] {
                    Mark::OnStack => bail!("cyclic superclass chain at {}", class_ref.name),
                    Mark::Done => {}
                    Mark::Unvisited => {
                        marks[supertype.as_usize()] = Mark::OnStack;
                        stack.push((supertype, 0));
                    }
                }
            }
        }
        Ok(())
    }

    fn lower_body(&mut self, method: MethodId, desc: &MethodDesc) -> anyhow::Result<()> {
        let mut scope = VarScope {
            method,
            vars: HashMap::new(),
        };
        let this_var = if desc.is_static {
            None
        } else {
            Some(self.var(&mut scope, THIS_VAR))
        };
        let params = desc
            .params
            .iter()
            .map(|p| self.var(&mut scope, p))
            .collect::<Vec<_>>();

        let mut body = Vec::with_capacity(desc.body.len());
        let mut return_vars = Vec::new();
        for (index, stmt_desc) in desc.body.iter().enumerate() {
            let stmt = self.lower_stmt(&mut scope, index, stmt_desc)?;
            if let Stmt::Return(Some(var)) = stmt {
                if !return_vars.contains(&var) {
                    return_vars.push(var);
                }
            }
            body.push(stmt);
        }

        let method_ref = &mut self.methods[method];
        method_ref.this_var = this_var;
        method_ref.params = params;
        method_ref.return_vars = return_vars;
        method_ref.body = body;
        Ok(())
    }

    fn var(&mut self, scope: &mut VarScope, name: &str) -> VarId {
        if let Some(id) = scope.vars.get(name) {
            return *id;
        }
        let id = self.vars.push(Var {
            name: name.to_string(),
            method: scope.method,
        });
        scope.vars.insert(name.to_string(), id);
        self.methods[scope.method].locals.push(id);
        id
    }

    fn lower_stmt(
        &mut self,
        scope: &mut VarScope,
        index: usize,
        desc: &StmtDesc,
    ) -> anyhow::Result<Stmt> {
        let stmt = match desc {
            StmtDesc::New { lhs, ty } => {
                let ty = self.parse_type(ty)?;
                let site = self.alloc_sites.push(AllocSite {
                    method: scope.method,
                    stmt_index: index,
                    ty,
                });
                Stmt::New {
                    lhs: self.var(scope, lhs),
                    site,
                }
            }
            StmtDesc::Copy { lhs, rhs } => Stmt::Copy {
                lhs: self.var(scope, lhs),
                rhs: self.var(scope, rhs),
            },
            StmtDesc::Load { lhs, base, field } => {
                let field = self.resolve_field(field)?;
                let lhs = self.var(scope, lhs);
                match base {
                    Some(base) => Stmt::LoadField {
                        lhs,
                        base: self.var(scope, base),
                        field,
                    },
                    None => Stmt::LoadStatic { lhs, field },
                }
            }
            StmtDesc::Store { base, field, rhs } => {
                let field = self.resolve_field(field)?;
                let rhs = self.var(scope, rhs);
                match base {
                    Some(base) => Stmt::StoreField {
                        base: self.var(scope, base),
                        field,
                        rhs,
                    },
                    None => Stmt::StoreStatic { field, rhs },
                }
            }
            StmtDesc::LoadArray { lhs, base } => Stmt::LoadArray {
                lhs: self.var(scope, lhs),
                base: self.var(scope, base),
            },
            StmtDesc::StoreArray { base, rhs } => Stmt::StoreArray {
                base: self.var(scope, base),
                rhs: self.var(scope, rhs),
            },
            StmtDesc::Invoke {
                call,
                class,
                method,
                receiver,
                args,
                result,
            } => {
                let receiver = match (call, receiver) {
                    (CallKind::Static, Some(_)) => {
                        bail!("static invocation of {}.{} has a receiver", class, method)
                    }
                    (CallKind::Static, None) => None,
                    (_, Some(recv)) => Some(self.var(scope, recv)),
                    (_, None) => {
                        bail!("instance invocation of {}.{} has no receiver", class, method)
                    }
                };
                Stmt::Invoke(InvokeExp {
                    kind: *call,
                    method_ref: MethodRef {
                        class: self.lookup_class(class)?,
                        subsignature: method.clone(),
                    },
                    receiver,
                    args: args.iter().map(|a| self.var(scope, a)).collect(),
                    result: result.as_ref().map(|r| self.var(scope, r)),
                })
            }
            StmtDesc::Return { var } => Stmt::Return(var.as_ref().map(|v| self.var(scope, v))),
            StmtDesc::Nop => Stmt::Nop,
        };
        Ok(stmt)
    }

    fn parse_type(&self, name: &str) -> anyhow::Result<JType> {
        if name.ends_with("[]") {
            Ok(JType::Array(name.to_string()))
        } else {
            Ok(JType::Class(self.lookup_class(name)?))
        }
    }

    /// Resolves `C.f` to the field `f` declared in `C` or its nearest superclass.
    fn resolve_field(&self, field_ref: &str) -> anyhow::Result<FieldId> {
        let (class_name, field_name) = field_ref
            .rsplit_once('.')
            .ok_or_else(|| anyhow!("malformed field reference {}", field_ref))?;
        let mut class = Some(self.lookup_class(class_name)?);
        while let Some(c) = class {
            let class_ref = &self.classes[c];
            if let Some(field) = class_ref
                .fields
                .iter()
                .copied()
                .find(|f| self.fields[*f].name == field_name)
            {
                return Ok(field);
            }
            class = class_ref.super_class;
        }
        Err(anyhow!("unknown field {}", field_ref))
    }
}

#[cfg(test)]
mod test {
    use crate::ir::program::Program;

    fn with_classes(classes: &str) -> String {
        format!(
            r#"{{
                "classes": [{},
                    {{"name": "Main", "methods": [{{"name": "main", "static": true, "body": []}}]}}
                ],
                "entry": {{"class": "Main", "method": "main/0"}}
            }}"#,
            classes
        )
    }

    #[test]
    fn cyclic_superclasses_are_rejected() {
        let json = with_classes(
            r#"{"name": "A", "super": "B", "methods": [
                {"name": "m", "body": [{"kind": "load", "lhs": "x", "base": "this", "field": "A.missing"}]}
            ]},
            {"name": "B", "super": "A"}"#,
        );
        let err = Program::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("cyclic superclass chain"), "{}", err);
    }

    #[test]
    fn cyclic_superinterfaces_are_rejected() {
        let json = with_classes(
            r#"{"name": "I", "interface": true, "interfaces": ["J"]},
            {"name": "J", "interface": true, "interfaces": ["K"]},
            {"name": "K", "interface": true, "interfaces": ["I"]},
            {"name": "C", "interfaces": ["I"]}"#,
        );
        let err = Program::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("cyclic superclass chain"), "{}", err);
    }

    #[test]
    fn diamonds_are_not_cycles() {
        let json = with_classes(
            r#"{"name": "Top", "interface": true},
            {"name": "Left", "interface": true, "interfaces": ["Top"]},
            {"name": "Right", "interface": true, "interfaces": ["Top"]},
            {"name": "Both", "interfaces": ["Left", "Right"]}"#,
        );
        assert!(Program::from_json_str(&json).is_ok());
    }

    #[test]
    fn locals_are_recorded_in_declaration_order() {
        let json = with_classes(
            r#"{"name": "Box", "fields": [{"name": "item"}], "methods": [
                {"name": "swap", "params": ["v"], "body": [
                    {"kind": "load", "lhs": "old", "base": "this", "field": "Box.item"},
                    {"kind": "store", "base": "this", "field": "Box.item", "rhs": "v"},
                    {"kind": "return", "var": "old"}
                ]}
            ]}"#,
        );
        let program = Program::from_json_str(&json).unwrap();
        let swap = program.find_method("Box", "swap/1").unwrap();
        let names: Vec<_> = program
            .method_locals(swap)
            .map(|v| program.var(v).name.as_str())
            .collect();
        assert_eq!(names, vec!["this", "v", "old"]);
        let main = program.find_method("Main", "main/0").unwrap();
        assert_eq!(program.method_locals(main).count(), 0);
    }
}
