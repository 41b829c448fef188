// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! A growable dense bit vector keyed by index newtypes. Points-to sets only
//! ever grow, so the vector offers no removal.

use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::iter;
use std::marker::PhantomData;
use std::slice;

type Word = u64;
const WORD_BITS: usize = Word::BITS as usize;

/// Represents some newtyped `usize` wrapper.
///
/// Purpose: avoid mixing indexes for different bitvector domains.
pub trait Idx: Copy + 'static + Eq + PartialEq + Debug + Hash {
    fn new(idx: usize) -> Self;

    fn index(self) -> usize;
}

impl Idx for usize {
    #[inline]
    fn new(idx: usize) -> Self {
        idx
    }
    #[inline]
    fn index(self) -> usize {
        self
    }
}

impl Idx for u32 {
    #[inline]
    fn new(idx: usize) -> Self {
        assert!(idx <= u32::MAX as usize);
        idx as u32
    }
    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Eq, PartialEq, Hash)]
pub struct BitVec<T> {
    words: Vec<Word>,
    marker: PhantomData<T>,
}

impl<T: Idx> BitVec<T> {
    #[inline]
    pub fn new_empty() -> BitVec<T> {
        BitVec {
            words: Vec::new(),
            marker: PhantomData,
        }
    }

    #[inline]
    fn ensure(&mut self, capacity: usize) {
        let min_num_words = num_words(capacity);
        if self.words.len() < min_num_words {
            self.words.resize(min_num_words, 0)
        }
    }

    /// Count the number of set bits in the set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|e| e.count_ones() as usize).sum()
    }

    #[inline]
    pub fn contains(&self, elem: T) -> bool {
        if capacity(&self.words) <= elem.index() {
            return false;
        }
        let (word_index, mask) = word_index_and_mask(elem);
        (self.words[word_index] & mask) != 0
    }

    /// Is `self` is a (non-strict) superset of `other`?
    pub fn superset(&self, other: &BitVec<T>) -> bool {
        other.words.iter().enumerate().all(|(i, b)| {
            let a = self.words.get(i).copied().unwrap_or(0);
            (a & b) == *b
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|a| *a == 0)
    }

    /// Insert `elem`. Returns whether the set has changed.
    #[inline]
    pub fn insert(&mut self, elem: T) -> bool {
        self.ensure(elem.index() + 1);
        let (word_index, mask) = word_index_and_mask(elem);
        let word_ref = &mut self.words[word_index];
        let word = *word_ref;
        *word_ref = word | mask;
        *word_ref != word
    }

    /// Iterates over the indices of set bits in a sorted order.
    #[inline]
    pub fn iter(&self) -> BitIter<'_, T> {
        BitIter::new(&self.words)
    }

    pub fn union(&mut self, other: &BitVec<T>) -> bool {
        self.ensure(capacity(&other.words));
        let mut changed = 0;
        for (out_elem, in_elem) in iter::zip(&mut self.words, &other.words) {
            let old_val = *out_elem;
            *out_elem = old_val | *in_elem;
            changed |= old_val ^ *out_elem;
        }
        changed != 0
    }

    /// Returns the bits set in `other` but not in `self`.
    pub fn missing_from(&self, other: &BitVec<T>) -> BitVec<T> {
        let words = other
            .words
            .iter()
            .enumerate()
            .map(|(i, b)| b & !self.words.get(i).copied().unwrap_or(0))
            .collect();
        BitVec {
            words,
            marker: PhantomData,
        }
    }
}

impl<T> Clone for BitVec<T> {
    fn clone(&self) -> Self {
        BitVec {
            words: self.words.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: Idx> Debug for BitVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct BitIter<'a, T: Idx> {
    /// A copy of the current word with the already visited bits cleared.
    word: Word,
    /// The offset (measured in bits) of the current word.
    offset: usize,
    iter: slice::Iter<'a, Word>,
    marker: PhantomData<T>,
}

impl<'a, T: Idx> BitIter<'a, T> {
    #[inline]
    fn new(words: &'a [Word]) -> BitIter<'a, T> {
        // `offset` starts one word before zero so that the first `next()`
        // lands on offset 0 after the wrapping add.
        BitIter {
            word: 0,
            offset: usize::MAX - (WORD_BITS - 1),
            iter: words.iter(),
            marker: PhantomData,
        }
    }
}

impl<'a, T: Idx> Iterator for BitIter<'a, T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        loop {
            if self.word != 0 {
                let bit_pos = self.word.trailing_zeros() as usize;
                self.word ^= 1 << bit_pos;
                return Some(T::new(bit_pos + self.offset));
            }
            let word = self.iter.next()?;
            self.word = *word;
            self.offset = self.offset.wrapping_add(WORD_BITS);
        }
    }
}

#[inline]
fn capacity(words: &[Word]) -> usize {
    words.len() * WORD_BITS
}

#[inline]
fn num_words(capacity: usize) -> usize {
    (capacity + WORD_BITS - 1) / WORD_BITS
}

#[inline]
fn word_index_and_mask<T: Idx>(elem: T) -> (usize, Word) {
    let elem = elem.index();
    (elem / WORD_BITS, 1 << (elem % WORD_BITS))
}

#[cfg(test)]
mod test {
    use super::BitVec;

    #[test]
    fn insert_across_words() {
        let mut bv = BitVec::<usize>::new_empty();
        assert!(bv.insert(3));
        assert!(bv.insert(130));
        assert!(!bv.insert(3));
        assert_eq!(bv.count(), 2);
        assert_eq!(bv.iter().collect::<Vec<_>>(), vec![3, 130]);
        assert!(!bv.contains(64));
    }

    #[test]
    fn missing_from_ignores_shorter_self() {
        let mut small = BitVec::<usize>::new_empty();
        small.insert(1);
        let mut large = BitVec::<usize>::new_empty();
        large.insert(1);
        large.insert(200);
        let missing = small.missing_from(&large);
        assert_eq!(missing.iter().collect::<Vec<_>>(), vec![200]);
        assert!(large.superset(&small));
        assert!(!small.superset(&large));
    }
}
