// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::*;
use jpta::cha::ClassHierarchyAnalysis;
use jpta::pta::run_pointer_analysis;
use jpta::pta::PTAType;

#[test]
fn cha_reaches_unallocated_overrides() {
    let acx = load("virtual_call.json", PTAType::Andersen, 1);
    let mut cha = ClassHierarchyAnalysis::new(&acx);
    cha.analyze();

    let callees = cha.call_graph().get_callees(&callsite(&acx, "Main", "main/0", 3));
    assert_eq!(
        signatures(&acx, &callees),
        vec![
            "<Cat: speak/0>".to_string(),
            "<Dog: speak/0>".to_string(),
            "<Fish: speak/0>".to_string(),
        ]
    );
    assert!(cha.dead_methods().is_empty());
}

#[test]
fn cha_walks_subinterface_implementors() {
    let acx = load("interface.json", PTAType::Andersen, 1);
    let mut cha = ClassHierarchyAnalysis::new(&acx);
    cha.analyze();

    let callees = cha.call_graph().get_callees(&callsite(&acx, "Main", "main/0", 3));
    assert_eq!(
        signatures(&acx, &callees),
        vec![
            "<Blob: area/0>".to_string(),
            "<Circle: area/0>".to_string(),
            "<Square: area/0>".to_string(),
        ]
    );
    let callees = cha.call_graph().get_callees(&callsite(&acx, "Main", "main/0", 4));
    assert_eq!(signatures(&acx, &callees), vec!["<Square: area/0>".to_string()]);
    assert!(cha.dead_methods().is_empty());
}

#[test]
fn cha_skips_undeclared_methods() {
    let acx = load("unresolved.json", PTAType::Andersen, 1);
    let mut cha = ClassHierarchyAnalysis::new(&acx);
    cha.analyze();
    assert!(cha.call_graph().get_callees(&callsite(&acx, "Main", "main/0", 2)).is_empty());
    assert_eq!(cha.call_graph().reachable_methods(), &[acx.entry_point]);
}

#[test]
fn cha_over_approximates_pointer_analysis() {
    for name in ["virtual_call.json", "context.json", "static_field.json", "array.json", "recursion.json", "interface.json", "this_call.json"] {
        let acx = load(name, PTAType::CallSiteSensitive, 1);
        let mut cha = ClassHierarchyAnalysis::new(&acx);
        cha.analyze();
        let result = run_pointer_analysis(&acx);
        for (callsite, _, callee, _) in result.ci_call_graph().edges() {
            assert!(cha.call_graph().has_edge(&callsite, callee), "{}", name);
        }
        for method in result.reachable_methods() {
            assert!(cha.call_graph().is_reachable(&method), "{}", name);
        }
    }
}
