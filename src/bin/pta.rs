// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The main routine of `jpta`.
//!
//! Loads a JSON program, runs either the pointer analysis or the class
//! hierarchy analysis on it, and dumps the requested results.

use log::*;
use std::env;

use jpta::cha::ClassHierarchyAnalysis;
use jpta::ir::analysis_context::AnalysisContext;
use jpta::pta;
use jpta::util::options::AnalysisOptions;
use jpta::util::results_dumper;

fn main() -> anyhow::Result<()> {
    // Initialize loggers.
    if env::var("PTA_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PTA_LOG")
            .write_style("PTA_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let args = env::args().skip(1).collect::<Vec<_>>();
    let mut options = AnalysisOptions::default();
    options.parse_from_args(&args[..]);
    info!("PTA Options: {:?}", options);

    let acx = AnalysisContext::from_options(options)?;
    if acx.analysis_options.cha {
        let mut cha = ClassHierarchyAnalysis::new(&acx);
        cha.analyze();
        results_dumper::dump_cha_results(&cha)?;
    } else {
        let result = pta::run_pointer_analysis(&acx);
        results_dumper::dump_results(&result)?;
    }
    Ok(())
}
