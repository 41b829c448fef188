// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Analysis options.

use anyhow::anyhow;
use clap::error::ErrorKind;
use clap::{Arg, Command};

use crate::pta::heap_model::HeapModelKind;
use crate::pta::PTAType;

const PTA_USAGE: &str = r#"pta [OPTIONS] INPUT"#;

/// Creates the clap::Command metadata for argument parsing.
fn make_options_parser() -> Command<'static> {
    let parser = Command::new("jpta")
        .no_binary_name(true)
        .override_usage(PTA_USAGE)
        .version(env!("CARGO_PKG_VERSION"))
        .arg(Arg::new("entry-func")
            .long("entry-func")
            .takes_value(true)
            .help("The entry method from which the analysis begins, written as `Class::subsignature`.")
            .long_help("Overrides the entry method recorded in the input program, e.g. `Main::main/1`."))
        .arg(Arg::new("pta-type")
            .long("pta-type")
            .takes_value(true)
            .value_parser(["andersen", "ander", "callsite-sensitive", "cs", "object-sensitive", "obj", "type-sensitive", "type"])
            .default_value("callsite-sensitive")
            .help("The type of pointer analysis."))
        .arg(Arg::new("context-depth")
            .long("context-depth")
            .takes_value(true)
            .value_parser(clap::value_parser!(u32))
            .default_value("1")
            .help("The context depth limit for a context-sensitive pointer analysis."))
        .arg(Arg::new("heap-context-depth")
            .long("heap-context-depth")
            .takes_value(true)
            .value_parser(clap::value_parser!(u32))
            .help("The context depth limit of heap objects. Defaults to the context depth minus one."))
        .arg(Arg::new("heap-model")
            .long("heap-model")
            .takes_value(true)
            .value_parser(["alloc-site", "type"])
            .default_value("alloc-site")
            .help("How allocation sites are abstracted into objects."))
        .arg(Arg::new("cha")
            .long("cha")
            .takes_value(false)
            .help("Build the call graph by class hierarchy analysis instead of pointer analysis."))
        .arg(Arg::new("dump-stats")
            .long("dump-stats")
            .takes_value(false)
            .help("Dump the statistics of the analysis results."))
        .arg(Arg::new("call-graph-output")
            .long("dump-call-graph")
            .takes_value(true)
            .help("Dump the call graph in DOT format to the output file."))
        .arg(Arg::new("pts-output")
            .long("dump-pts")
            .takes_value(true)
            .help("Dump points-to results to the output file, or `stdout`."))
        .arg(Arg::new("json-output")
            .long("dump-json")
            .takes_value(true)
            .help("Dump the points-to results and the call graph as JSON to the output file."))
        .arg(Arg::new("dead-methods-output")
            .long("dump-dead-methods")
            .takes_value(true)
            .help("Dump the methods unreachable from the entry to the output file, or `stdout`."))
        .arg(Arg::new("INPUT")
            .required(true)
            .help("The JSON program to be analyzed."));
    parser
}

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub input: String,
    pub entry_func: Option<String>,
    pub pta_type: PTAType,
    // options for context-sensitive analysis
    pub context_depth: u32,
    pub heap_context_depth: Option<u32>,
    pub heap_model: HeapModelKind,
    pub cha: bool,

    pub dump_stats: bool,
    pub call_graph_output: Option<String>,
    pub pts_output: Option<String>,
    pub json_output: Option<String>,
    pub dead_methods_output: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            input: String::new(),
            entry_func: None,
            pta_type: PTAType::CallSiteSensitive,
            context_depth: 1,
            heap_context_depth: None,
            heap_model: HeapModelKind::AllocSite,
            cha: false,
            dump_stats: false,
            call_graph_output: None,
            pts_output: None,
            json_output: None,
            dead_methods_output: None,
        }
    }
}

impl AnalysisOptions {
    /// The depth limit of heap contexts.
    pub fn heap_depth(&self) -> u32 {
        self.heap_context_depth
            .unwrap_or_else(|| self.context_depth.saturating_sub(1))
    }

    /// Splits `--entry-func` into the class name and the method subsignature.
    pub fn entry_method(&self) -> anyhow::Result<Option<(&str, &str)>> {
        match &self.entry_func {
            Some(entry) => entry
                .rsplit_once("::")
                .map(Some)
                .ok_or_else(|| anyhow!("malformed entry method {}, expected `Class::subsignature`", entry)),
            None => Ok(None),
        }
    }

    /// Parses options from a list of strings, not including the binary name.
    /// Prints help or version information and exits when they are requested.
    pub fn parse_from_args(&mut self, args: &[String]) {
        let matches = match make_options_parser().try_get_matches_from(args.iter()) {
            Ok(matches) => matches,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    print!("{e}");
                    std::process::exit(0);
                }
                _ => e.exit(),
            },
        };

        if let Some(s) = matches.get_one::<String>("INPUT") {
            self.input = s.clone();
        }
        self.entry_func = matches.get_one::<String>("entry-func").cloned();

        if let Some(pta_type) = matches.get_one::<String>("pta-type") {
            self.pta_type = match pta_type.as_str() {
                "andersen" | "ander" => PTAType::Andersen,
                "callsite-sensitive" | "cs" => PTAType::CallSiteSensitive,
                "object-sensitive" | "obj" => PTAType::ObjectSensitive,
                "type-sensitive" | "type" => PTAType::TypeSensitive,
                _ => unreachable!(),
            }
        }

        if let Some(depth) = matches.get_one::<u32>("context-depth") {
            self.context_depth = *depth;
        }
        self.heap_context_depth = matches.get_one::<u32>("heap-context-depth").cloned();

        if let Some(heap_model) = matches.get_one::<String>("heap-model") {
            self.heap_model = match heap_model.as_str() {
                "alloc-site" => HeapModelKind::AllocSite,
                "type" => HeapModelKind::Type,
                _ => unreachable!(),
            }
        }
        self.cha = matches.contains_id("cha");

        self.dump_stats = matches.contains_id("dump-stats");
        self.call_graph_output = matches.get_one::<String>("call-graph-output").cloned();
        self.pts_output = matches.get_one::<String>("pts-output").cloned();
        self.json_output = matches.get_one::<String>("json-output").cloned();
        self.dead_methods_output = matches.get_one::<String>("dead-methods-output").cloned();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> AnalysisOptions {
        let mut options = AnalysisOptions::default();
        let args = args.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        options.parse_from_args(&args);
        options
    }

    #[test]
    fn defaults() {
        let options = parse(&["prog.json"]);
        assert_eq!(options.input, "prog.json");
        assert_eq!(options.pta_type, PTAType::CallSiteSensitive);
        assert_eq!(options.context_depth, 1);
        assert_eq!(options.heap_depth(), 0);
        assert_eq!(options.heap_model, HeapModelKind::AllocSite);
        assert!(!options.cha);
        assert!(options.entry_method().unwrap().is_none());
    }

    #[test]
    fn object_sensitivity_with_heap_depth() {
        let options = parse(&[
            "--pta-type",
            "obj",
            "--context-depth",
            "2",
            "--heap-context-depth",
            "2",
            "--entry-func",
            "app.Main::main/1",
            "--dump-stats",
            "prog.json",
        ]);
        assert_eq!(options.pta_type, PTAType::ObjectSensitive);
        assert_eq!(options.context_depth, 2);
        assert_eq!(options.heap_depth(), 2);
        assert!(options.dump_stats);
        assert_eq!(options.entry_method().unwrap(), Some(("app.Main", "main/1")));
    }
}
