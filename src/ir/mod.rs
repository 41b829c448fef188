// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The program representation consumed by the analyses.

pub mod analysis_context;
pub mod call_site;
pub mod class_hierarchy;
pub mod context;
pub mod loader;
pub mod method;
pub mod program;
pub mod stmt;
