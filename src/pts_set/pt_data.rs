// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use super::points_to::PointsToSet;
use crate::util::bit_vec::Idx;

/// Basic points-to data structure.
/// Given a key (a pointer node), return its points-to set.
///
/// K  (Key):     "owning" pointer of a points-to set.
/// D  (Data):    elements in points-to sets.
/// DS (DataSet): the points-to set; a collection of Data.
///
/// Sets only grow: the only mutations are `add_pts` and `propagate`.
pub struct PTData<K, D, DS> {
    pts_map: HashMap<K, DS>,
    marker: PhantomData<D>,
}

impl<K, D, DS> fmt::Debug for PTData<K, D, DS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "PTData".fmt(f)
    }
}

impl<K, D, DS> Default for PTData<K, D, DS>
where
    K: Hash + Eq + Copy,
    D: Idx,
    DS: PointsToSet<D>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, D, DS> PTData<K, D, DS>
where
    K: Hash + Eq + Copy,
    D: Idx,
    DS: PointsToSet<D>,
{
    pub fn new() -> PTData<K, D, DS> {
        PTData {
            pts_map: HashMap::new(),
            marker: PhantomData,
        }
    }

    /// Return Points-to map
    #[inline]
    pub fn get_pts_map(&self) -> &HashMap<K, DS> {
        &self.pts_map
    }

    /// Get points-to set of a pointer.
    #[inline]
    pub fn get_pts(&self, var: K) -> Option<&DS> {
        self.pts_map.get(&var)
    }

    /// Returns true if the pointer points to nothing yet.
    #[inline]
    pub fn is_empty(&self, var: K) -> bool {
        self.pts_map.get(&var).map_or(true, |pts| pts.is_empty())
    }

    /// Adds element to the points-to set associated with var.
    pub fn add_pts(&mut self, var: K, elem: D) -> bool {
        self.pts_map.entry(var).or_insert_with(DS::new).insert(elem)
    }

    /// Merges `src_ds` into the points-to set of `var` and returns the
    /// elements that were not there before.
    pub fn propagate(&mut self, var: K, src_ds: &DS) -> DS {
        let pts = self.pts_map.entry(var).or_insert_with(DS::new);
        let delta = src_ds.difference(pts);
        if !delta.is_empty() {
            pts.union(&delta);
        }
        delta
    }

    /// Total number of (pointer, object) pairs.
    pub fn num_relations(&self) -> usize {
        self.pts_map.values().map(|pts| pts.count()).sum()
    }
}
