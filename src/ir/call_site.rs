// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use serde::Serialize;

use super::context::ContextId;
use super::method::CSMethodId;
use super::program::MethodId;
pub use super::stmt::CallKind;

/// An invoke statement, identified by its enclosing method and its position
/// in the method body.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize)]
pub struct CallSite {
    pub method: MethodId,
    pub stmt_index: usize,
}

impl CallSite {
    pub fn new(method: MethodId, stmt_index: usize) -> Self {
        CallSite { method, stmt_index }
    }
}

/// A call site under the context of its enclosing method.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CSCallSite {
    pub cid: ContextId,
    pub callsite: CallSite,
}

impl CSCallSite {
    pub fn new(cid: ContextId, callsite: CallSite) -> Self {
        CSCallSite { cid, callsite }
    }

    /// The context-sensitive method containing this call site.
    pub fn caller(&self) -> CSMethodId {
        CSMethodId::new(self.cid, self.callsite.method)
    }
}

impl From<CSCallSite> for CallSite {
    fn from(callsite: CSCallSite) -> Self {
        callsite.callsite
    }
}
