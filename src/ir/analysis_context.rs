// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::anyhow;
use log::*;

use super::class_hierarchy::ClassHierarchy;
use super::program::{MethodId, Program};
use crate::util::options::AnalysisOptions;

/// Global information of the analysis
pub struct AnalysisContext {
    /// The program under analysis.
    pub program: Program,

    pub hierarchy: ClassHierarchy,

    /// The entry method of the analysis.
    pub entry_point: MethodId,

    /// Options of the analysis.
    pub analysis_options: AnalysisOptions,
}

impl AnalysisContext {
    /// Builds the context for `program`. The entry method named in the options
    /// takes precedence over the one recorded in the program.
    pub fn new(program: Program, analysis_options: AnalysisOptions) -> anyhow::Result<Self> {
        info!("Initializing AnalysisContext");
        let entry_point = match analysis_options.entry_method()? {
            Some((class, subsig)) => program
                .find_method(class, subsig)
                .ok_or_else(|| anyhow!("entry method {}::{} is not declared", class, subsig))?,
            None => program.entry,
        };
        if program.method(entry_point).is_abstract {
            return Err(anyhow!(
                "entry method {} is abstract",
                program.method_signature(entry_point)
            ));
        }
        let hierarchy = ClassHierarchy::new(&program);
        debug!("Entry method: {}", program.method_signature(entry_point));
        Ok(AnalysisContext {
            program,
            hierarchy,
            entry_point,
            analysis_options,
        })
    }

    /// Loads the program named by the `input` option.
    pub fn from_options(analysis_options: AnalysisOptions) -> anyhow::Result<Self> {
        let program = Program::from_file(Path::new(&analysis_options.input))?;
        Self::new(program, analysis_options)
    }

    #[inline]
    pub fn method_name(&self, method: MethodId) -> String {
        self.program.method_signature(method)
    }
}
