// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Call graph construction by class hierarchy analysis.

pub mod cha;

pub use self::cha::ClassHierarchyAnalysis;
