// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use super::context::ContextId;
use super::program::MethodId;

/// Context-sensitive method consisting of a context_id (cid) and a method id.
#[derive(Copy, Clone, Debug, Eq, PartialOrd, PartialEq, Hash, Ord)]
pub struct CSMethodId {
    pub cid: ContextId,
    pub method: MethodId,
}

impl CSMethodId {
    pub fn new(cid: ContextId, method: MethodId) -> Self {
        Self { cid, method }
    }
}

impl From<CSMethodId> for MethodId {
    fn from(m: CSMethodId) -> Self {
        m.method
    }
}
