// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use serde::{Deserialize, Serialize};

use super::program::{AllocSiteId, ClassId, FieldId, VarId};

/// The dispatch rule of an invocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    /// Calls to static methods, resolved against the declared class.
    Static,
    /// Constructor, private and super calls, resolved against the declared class.
    Special,
    /// Calls dispatched on the runtime class of the receiver.
    Virtual,
    /// Calls through an interface, dispatched on the runtime class of the receiver.
    Interface,
}

impl CallKind {
    #[inline]
    pub fn is_static(self) -> bool {
        matches!(self, CallKind::Static)
    }

    /// Returns true if the target depends on the receiver's dynamic type.
    #[inline]
    pub fn is_dynamic_dispatch(self) -> bool {
        matches!(self, CallKind::Virtual | CallKind::Interface)
    }
}

/// A symbolic reference to a method: the declaring class named at the call
/// site and the subsignature to look up.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: ClassId,
    pub subsignature: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokeExp {
    pub kind: CallKind,
    pub method_ref: MethodRef,
    pub receiver: Option<VarId>,
    pub args: Vec<VarId>,
    pub result: Option<VarId>,
}

/// Statements of a method body. Only the shapes relevant to pointer flow are
/// distinguished; everything else is a `Nop`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// `lhs = new T`
    New { lhs: VarId, site: AllocSiteId },
    /// `lhs = rhs`
    Copy { lhs: VarId, rhs: VarId },
    /// `lhs = C.f`
    LoadStatic { lhs: VarId, field: FieldId },
    /// `C.f = rhs`
    StoreStatic { field: FieldId, rhs: VarId },
    /// `lhs = base.f`
    LoadField { lhs: VarId, base: VarId, field: FieldId },
    /// `base.f = rhs`
    StoreField { base: VarId, field: FieldId, rhs: VarId },
    /// `lhs = base[*]`
    LoadArray { lhs: VarId, base: VarId },
    /// `base[*] = rhs`
    StoreArray { base: VarId, rhs: VarId },
    Invoke(InvokeExp),
    Return(Option<VarId>),
    Nop,
}

impl Stmt {
    pub fn as_invoke(&self) -> Option<&InvokeExp> {
        match self {
            Stmt::Invoke(invoke) => Some(invoke),
            _ => None,
        }
    }
}
