// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

/// Declares a dense `u32` index newtype usable as a bit vector domain.
///
/// ```ignore
/// newtype_index! {
///     /// The unique identifier for each variable.
///     #[debug_format = "VarId({})"]
///     pub struct VarId {}
/// }
/// ```
macro_rules! newtype_index {
    ($(#[doc = $doc:expr])* #[debug_format = $fmt:literal] $vis:vis struct $name:ident {}) => {
        $(#[doc = $doc])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
        $vis struct $name(u32);

        impl $name {
            #[inline]
            pub fn from_usize(idx: usize) -> Self {
                assert!(idx <= u32::MAX as usize, "index overflow");
                $name(idx as u32)
            }

            #[inline]
            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl $crate::util::bit_vec::Idx for $name {
            #[inline]
            fn new(idx: usize) -> Self {
                Self::from_usize(idx)
            }

            #[inline]
            fn index(self) -> usize {
                self.as_usize()
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, $fmt, self.0)
            }
        }
    };
}

pub(crate) use newtype_index;

use crate::util::bit_vec::Idx;

/// An append-only arena that hands out dense ids for interned values.
#[derive(Debug)]
pub struct IndexVec<I, T> {
    raw: Vec<T>,
    marker: std::marker::PhantomData<I>,
}

impl<I: Idx, T> Default for IndexVec<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, T> IndexVec<I, T> {
    pub fn new() -> Self {
        IndexVec {
            raw: Vec::new(),
            marker: std::marker::PhantomData,
        }
    }

    /// Appends `value` and returns its id.
    pub fn push(&mut self, value: T) -> I {
        let id = I::new(self.raw.len());
        self.raw.push(value);
        id
    }

    #[inline]
    pub fn get(&self, id: I) -> Option<&T> {
        self.raw.get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.raw.get_mut(id.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.raw.iter()
    }

    pub fn iter_enumerated(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.raw.iter().enumerate().map(|(i, t)| (I::new(i), t))
    }
}

impl<I: Idx, T> std::ops::Index<I> for IndexVec<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, id: I) -> &T {
        &self.raw[id.index()]
    }
}

impl<I: Idx, T> std::ops::IndexMut<I> for IndexVec<I, T> {
    #[inline]
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.raw[id.index()]
    }
}
