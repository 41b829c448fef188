// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::slice;

use crate::util::bit_vec::{BitIter, BitVec, Idx};

/// Sets up to this size are stored as sorted vectors.
const SMALL_SET_CAPACITY: usize = 32;

/// A monotone set of abstract objects. Elements can be added but never removed.
pub trait PointsToSet<T> {
    type Iter<'a>: Iterator<Item = T>
    where
        Self: 'a;

    fn new() -> Self;
    fn count(&self) -> usize;
    fn contains(&self, elem: T) -> bool;
    fn is_empty(&self) -> bool;
    fn superset(&self, other: &Self) -> bool;
    fn insert(&mut self, elem: T) -> bool;
    fn union(&mut self, other: &Self) -> bool;
    /// Elements of `self` that are not in `other`.
    fn difference(&self, other: &Self) -> Self;
    fn iter<'a>(&'a self) -> Self::Iter<'a>;
}

/// Points-to set that starts out sparse and switches to a bit vector once it
/// outgrows `SMALL_SET_CAPACITY`. Iteration is in ascending index order for
/// both representations.
#[derive(Clone)]
pub struct HybridPointsToSet<T> {
    points_to: HybridSet<T>,
}

impl<T: Idx> fmt::Debug for HybridPointsToSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Idx> Default for HybridPointsToSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Idx> HybridPointsToSet<T> {
    pub fn singleton(elem: T) -> Self {
        HybridPointsToSet {
            points_to: HybridSet::Sparse(vec![elem]),
        }
    }
}

impl<'a, T: Idx> IntoIterator for &'a HybridPointsToSet<T> {
    type Item = T;
    type IntoIter = HybridIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Idx> PointsToSet<T> for HybridPointsToSet<T> {
    type Iter<'a> = HybridIter<'a, T>;

    fn new() -> Self {
        HybridPointsToSet {
            points_to: HybridSet::Sparse(Vec::new()),
        }
    }

    fn count(&self) -> usize {
        self.points_to.count()
    }

    fn contains(&self, elem: T) -> bool {
        self.points_to.contains(elem)
    }

    fn is_empty(&self) -> bool {
        self.points_to.is_empty()
    }

    fn superset(&self, other: &Self) -> bool {
        self.points_to.superset(&other.points_to)
    }

    /// Returns true if `elem` was not already in the set.
    fn insert(&mut self, elem: T) -> bool {
        self.points_to.insert(elem)
    }

    /// Returns true if any element of `other` was added.
    fn union(&mut self, other: &Self) -> bool {
        self.points_to.union(&other.points_to)
    }

    fn difference(&self, other: &Self) -> Self {
        HybridPointsToSet {
            points_to: self.points_to.difference(&other.points_to),
        }
    }

    fn iter(&self) -> HybridIter<'_, T> {
        match &self.points_to {
            HybridSet::Sparse(elems) => HybridIter::Sparse(elems.iter()),
            HybridSet::Dense(bits) => HybridIter::Dense(bits.iter()),
        }
    }
}

#[derive(Clone)]
enum HybridSet<T> {
    /// Sorted by index, without duplicates.
    Sparse(Vec<T>),
    Dense(BitVec<T>),
}

impl<T: Idx> HybridSet<T> {
    fn count(&self) -> usize {
        match self {
            HybridSet::Sparse(elems) => elems.len(),
            HybridSet::Dense(bits) => bits.count(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            HybridSet::Sparse(elems) => elems.is_empty(),
            HybridSet::Dense(bits) => bits.is_empty(),
        }
    }

    fn contains(&self, elem: T) -> bool {
        match self {
            HybridSet::Sparse(elems) => search(elems, elem).is_ok(),
            HybridSet::Dense(bits) => bits.contains(elem),
        }
    }

    fn superset(&self, other: &HybridSet<T>) -> bool {
        match (self, other) {
            (HybridSet::Dense(lhs), HybridSet::Dense(rhs)) => lhs.superset(rhs),
            (_, HybridSet::Sparse(elems)) => elems.iter().all(|elem| self.contains(*elem)),
            (HybridSet::Sparse(_), HybridSet::Dense(rhs)) => {
                // A sparse set cannot hold more elements than the capacity.
                rhs.count() <= self.count() && rhs.iter().all(|elem| self.contains(elem))
            }
        }
    }

    fn insert(&mut self, elem: T) -> bool {
        match self {
            HybridSet::Dense(bits) => bits.insert(elem),
            HybridSet::Sparse(elems) => match search(elems, elem) {
                Ok(_) => false,
                Err(pos) if elems.len() < SMALL_SET_CAPACITY => {
                    elems.insert(pos, elem);
                    true
                }
                Err(_) => {
                    let mut bits = to_dense(elems);
                    bits.insert(elem);
                    *self = HybridSet::Dense(bits);
                    true
                }
            },
        }
    }

    fn union(&mut self, other: &HybridSet<T>) -> bool {
        match (&mut *self, other) {
            (HybridSet::Dense(lhs), HybridSet::Dense(rhs)) => lhs.union(rhs),
            (HybridSet::Dense(lhs), HybridSet::Sparse(rhs)) => {
                rhs.iter().fold(false, |changed, elem| lhs.insert(*elem) | changed)
            }
            (HybridSet::Sparse(lhs), HybridSet::Dense(rhs)) => {
                let mut bits = to_dense(lhs);
                let changed = bits.union(rhs);
                *self = HybridSet::Dense(bits);
                changed
            }
            (HybridSet::Sparse(lhs), HybridSet::Sparse(rhs)) => {
                let merged = merge_sorted(lhs, rhs);
                if merged.len() == lhs.len() {
                    return false;
                }
                *self = if merged.len() <= SMALL_SET_CAPACITY {
                    HybridSet::Sparse(merged)
                } else {
                    HybridSet::Dense(to_dense(&merged))
                };
                true
            }
        }
    }

    fn difference(&self, other: &HybridSet<T>) -> HybridSet<T> {
        let elems: Vec<T> = match (self, other) {
            (HybridSet::Dense(lhs), HybridSet::Dense(rhs)) => {
                let diff = rhs.missing_from(lhs);
                if diff.count() > SMALL_SET_CAPACITY {
                    return HybridSet::Dense(diff);
                }
                diff.iter().collect()
            }
            (HybridSet::Sparse(lhs), _) => lhs.iter().copied().filter(|e| !other.contains(*e)).collect(),
            (HybridSet::Dense(lhs), _) => lhs.iter().filter(|e| !other.contains(*e)).collect(),
        };
        if elems.len() <= SMALL_SET_CAPACITY {
            HybridSet::Sparse(elems)
        } else {
            HybridSet::Dense(to_dense(&elems))
        }
    }
}

#[inline]
fn search<T: Idx>(elems: &[T], elem: T) -> Result<usize, usize> {
    elems.binary_search_by_key(&elem.index(), |e| e.index())
}

fn to_dense<T: Idx>(elems: &[T]) -> BitVec<T> {
    let mut bits = BitVec::new_empty();
    for elem in elems {
        bits.insert(*elem);
    }
    bits
}

/// Merges two sorted, duplicate-free slices.
fn merge_sorted<T: Idx>(lhs: &[T], rhs: &[T]) -> Vec<T> {
    let mut merged = Vec::with_capacity(lhs.len() + rhs.len());
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        let (a, b) = (lhs[i], rhs[j]);
        if a.index() < b.index() {
            merged.push(a);
            i += 1;
        } else if b.index() < a.index() {
            merged.push(b);
            j += 1;
        } else {
            merged.push(a);
            i += 1;
            j += 1;
        }
    }
    merged.extend_from_slice(&lhs[i..]);
    merged.extend_from_slice(&rhs[j..]);
    merged
}

pub enum HybridIter<'a, T: Idx> {
    Sparse(slice::Iter<'a, T>),
    Dense(BitIter<'a, T>),
}

impl<'a, T: Idx> Iterator for HybridIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self {
            HybridIter::Sparse(iter) => iter.next().copied(),
            HybridIter::Dense(iter) => iter.next(),
        }
    }
}
