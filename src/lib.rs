// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Whole-program pointer analysis for a small object-oriented IR.
//!
//! Programs are loaded from JSON into [`ir::program::Program`]. The pointer
//! analyses in [`pta`] compute points-to sets and build the call graph on the
//! fly, either context-insensitively or under call-site, object or type
//! sensitivity. [`cha`] builds a call graph from the class hierarchy alone.

#![allow(
    clippy::single_match,
    clippy::needless_lifetimes,
    clippy::needless_return,
    clippy::len_zero
)]

pub mod builder;
pub mod cha;
pub mod graph;
pub mod ir;
pub mod pta;
pub mod pts_set;
pub mod util;
