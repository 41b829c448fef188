// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use std::collections::HashMap;

use petgraph::visit::EdgeRef;

use common::*;
use jpta::graph::pfg::Pointer;
use jpta::ir::method::CSMethodId;
use jpta::pta::context_sensitive::ContextSensitivePTA;
use jpta::pta::context_strategy::KCallSiteSensitive;
use jpta::pta::run_pointer_analysis;
use jpta::pta::PTAType;
use jpta::pts_set::points_to::PointsToSet;
use jpta::util::results_dumper::JsonResult;

const MAIN: &str = "main/0";

#[test]
fn copies_propagate_transitively() {
    let acx = load("copy.json", PTAType::Andersen, 1);
    let result = run_pointer_analysis(&acx);
    let x_obj = site(&acx, "Main", MAIN, 0);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "y")), vec![x_obj.clone()]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "z")), vec![x_obj]);
    assert!(!result.may_alias(var(&acx, "Main", MAIN, "z"), var(&acx, "Main", MAIN, "w")));
}

#[test]
fn fields_are_kept_apart_per_object() {
    let acx = load("field.json", PTAType::Andersen, 1);
    let result = run_pointer_analysis(&acx);
    let b = site(&acx, "Main", MAIN, 1);
    let c = site(&acx, "Main", MAIN, 5);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "z")), vec![b.clone()]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "u")), vec![c]);
    // The load through `p` is created after `x.f` already holds B.
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "q")), vec![b]);

    let x_obj = *result.ci_points_to(var(&acx, "Main", MAIN, "x")).iter().next().unwrap();
    let field = acx.program.fields.iter_enumerated().find(|(_, f)| f.name == "f").unwrap().0;
    assert_eq!(result.instance_field_points_to(x_obj, field).len(), 1);
}

#[test]
fn virtual_calls_dispatch_on_receiver_objects() {
    let acx = load("virtual_call.json", PTAType::Andersen, 1);
    let result = run_pointer_analysis(&acx);

    let callees = result.callees_of(callsite(&acx, "Main", MAIN, 3));
    assert_eq!(
        signatures(&acx, &callees),
        vec!["<Cat: speak/0>".to_string(), "<Dog: speak/0>".to_string()]
    );
    // Puppy inherits speak from Dog.
    let callees = result.callees_of(callsite(&acx, "Main", MAIN, 5));
    assert_eq!(signatures(&acx, &callees), vec!["<Dog: speak/0>".to_string()]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "s")), vec![site(&acx, "Main", MAIN, 4)]);

    let dead = signatures(&acx, &result.dead_methods());
    assert!(dead.contains(&"<Fish: speak/0>".to_string()));
    assert!(!dead.contains(&"<Animal: speak/0>".to_string()));
    assert!(!dead.contains(&"<Animal: self/0>".to_string()));
}

#[test]
fn interface_calls_dispatch_to_each_implementor() {
    let acx = load("interface.json", PTAType::Andersen, 1);
    let result = run_pointer_analysis(&acx);

    let callees = result.callees_of(callsite(&acx, "Main", MAIN, 3));
    assert_eq!(
        signatures(&acx, &callees),
        vec!["<Circle: area/0>".to_string(), "<Square: area/0>".to_string()]
    );
    assert_eq!(
        pts(&result, var(&acx, "Main", MAIN, "a")),
        sorted(vec![site(&acx, "Circle", "area/0", 0), site(&acx, "Square", "area/0", 0)])
    );
    // Square implements Shape through Polygon.
    let callees = result.callees_of(callsite(&acx, "Main", MAIN, 4));
    assert_eq!(signatures(&acx, &callees), vec!["<Square: area/0>".to_string()]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "b")), vec![site(&acx, "Square", "area/0", 0)]);

    assert!(signatures(&acx, &result.dead_methods()).contains(&"<Blob: area/0>".to_string()));
}

#[test]
fn calls_and_stores_on_this_reach_the_first_receiver() {
    for pta_type in [
        PTAType::Andersen,
        PTAType::CallSiteSensitive,
        PTAType::ObjectSensitive,
        PTAType::TypeSensitive,
    ] {
        let acx = load("this_call.json", pta_type, 1);
        let result = run_pointer_analysis(&acx);
        assert!(result.is_reachable(method(&acx, "A", "bar/0")), "{:?}", pta_type);
        assert_eq!(
            signatures(&acx, &result.callees_of(callsite(&acx, "A", "foo/0", 0))),
            vec!["<A: bar/0>".to_string()]
        );
        assert_eq!(pts(&result, var(&acx, "Main", MAIN, "y")), vec![site(&acx, "A", "bar/0", 0)]);
        assert_eq!(pts(&result, var(&acx, "Main", MAIN, "z")), vec![site(&acx, "A", "foo/0", 1)]);
    }
}

#[test]
fn andersen_merges_boxes() {
    let acx = load("context.json", PTAType::Andersen, 1);
    let result = run_pointer_analysis(&acx);
    let items = sorted(vec![site(&acx, "Main", MAIN, 2), site(&acx, "Main", MAIN, 3)]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "r1")), items);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "r2")), items);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "x1")), items);
    assert_eq!(result.num_contexts(), 1);
}

#[test]
fn object_sensitivity_separates_boxes() {
    let acx = load("context.json", PTAType::ObjectSensitive, 1);
    let result = run_pointer_analysis(&acx);
    let i1 = site(&acx, "Main", MAIN, 2);
    let i2 = site(&acx, "Main", MAIN, 3);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "r1")), vec![i1.clone()]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "r2")), vec![i2.clone()]);
    // Static calls keep the caller context, so `id` is not separated.
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "x1")), sorted(vec![i1, i2]));

    let this = var(&acx, "Box", "set/1", "this");
    let contexts = result.contexts_of(this);
    assert_eq!(contexts.len(), 2);
    let receivers: Vec<_> = contexts
        .iter()
        .map(|cid| {
            let pts = result.cs_points_to(*cid, this).unwrap();
            assert_eq!(pts.count(), 1);
            pts.iter().next().unwrap()
        })
        .collect();
    assert_ne!(receivers[0], receivers[1]);
}

#[test]
fn call_site_sensitivity_separates_identity_calls() {
    let acx = load("context.json", PTAType::CallSiteSensitive, 1);
    let result = run_pointer_analysis(&acx);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "x1")), vec![site(&acx, "Main", MAIN, 2)]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "x2")), vec![site(&acx, "Main", MAIN, 3)]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "r1")), vec![site(&acx, "Main", MAIN, 2)]);
}

#[test]
fn type_sensitivity_merges_boxes_allocated_in_one_class() {
    let acx = load("context.json", PTAType::TypeSensitive, 1);
    let result = run_pointer_analysis(&acx);
    let items = sorted(vec![site(&acx, "Main", MAIN, 2), site(&acx, "Main", MAIN, 3)]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "r1")), items);
    assert_eq!(result.contexts_of(var(&acx, "Box", "set/1", "this")).len(), 1);
}

#[test]
fn arrays_merge_elements_per_object() {
    let acx = load("array.json", PTAType::Andersen, 1);
    let result = run_pointer_analysis(&acx);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "j")), vec![site(&acx, "Main", MAIN, 1)]);
    assert!(pts(&result, var(&acx, "Main", MAIN, "k")).is_empty());

    let arr = *result.ci_points_to(var(&acx, "Main", MAIN, "arr")).iter().next().unwrap();
    assert_eq!(result.array_points_to(arr).len(), 1);

    // Calls on arrays dispatch to the root class.
    assert!(result.is_reachable(method(&acx, "java.lang.Object", "hashCode/0")));
    assert_eq!(
        pts(&result, var(&acx, "Main", MAIN, "h")),
        vec![site(&acx, "java.lang.Object", "hashCode/0", 0)]
    );
}

#[test]
fn special_calls_bind_this_and_static_fields_flow() {
    let acx = load("static_field.json", PTAType::CallSiteSensitive, 1);
    let result = run_pointer_analysis(&acx);
    let derived = site(&acx, "Main", MAIN, 0);
    let tag = site(&acx, "Main", MAIN, 1);

    assert!(result.is_reachable(method(&acx, "Base", "<init>/1")));
    assert_eq!(pts(&result, var(&acx, "Base", "<init>/1", "this")), vec![derived.clone()]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "e")), vec![derived]);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "g")), vec![tag]);

    let last = acx.program.fields.iter_enumerated().find(|(_, f)| f.name == "last").unwrap().0;
    assert_eq!(result.static_field_points_to(last).len(), 1);
}

#[test]
fn recursion_terminates_with_bounded_contexts() {
    let acx = load("recursion.json", PTAType::CallSiteSensitive, 2);
    let result = run_pointer_analysis(&acx);
    let node = site(&acx, "Main", "build/1", 0);
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "l")), vec![node.clone()]);
    assert_eq!(
        pts(&result, var(&acx, "Main", MAIN, "t")),
        sorted(vec![site(&acx, "Main", MAIN, 0), node])
    );
    assert!(result.contexts_of(var(&acx, "Main", "build/1", "m")).len() <= 3);
}

#[test]
fn unresolved_calls_are_skipped() {
    let acx = load("unresolved.json", PTAType::Andersen, 1);
    let result = run_pointer_analysis(&acx);
    // Plain declares area/0 but does not implement Shape.
    assert!(result.callees_of(callsite(&acx, "Main", MAIN, 1)).is_empty());
    assert!(result.callees_of(callsite(&acx, "Main", MAIN, 2)).is_empty());
    assert!(pts(&result, var(&acx, "Main", MAIN, "a")).is_empty());
    assert_eq!(pts(&result, var(&acx, "Main", MAIN, "t")), vec![site(&acx, "Main", MAIN, 0)]);
    assert_eq!(result.reachable_methods(), vec![acx.entry_point]);
    assert!(signatures(&acx, &result.dead_methods()).contains(&"<Plain: area/0>".to_string()));
}

#[test]
fn points_to_sets_only_grow() {
    let acx = load("context.json", PTAType::CallSiteSensitive, 1);
    let mut pta = ContextSensitivePTA::new(&acx, KCallSiteSensitive::new(1, 0));
    pta.initialize();
    let mut reachable = 0;
    loop {
        let before: HashMap<_, Vec<_>> = pta
            .get_pt_data()
            .get_pts_map()
            .iter()
            .map(|(ptr, pts)| (*ptr, pts.iter().collect()))
            .collect();
        if !pta.step() {
            break;
        }
        for (ptr, objs) in before {
            let after = pta.get_pt_data().get_pts(ptr).unwrap();
            assert!(objs.iter().all(|obj| after.contains(*obj)));
        }
        let now = pta.call_graph.reachable_methods().len();
        assert!(now >= reachable);
        reachable = now;
    }
}

#[test]
fn fixed_point_is_closed_under_flow_edges() {
    for (name, pta_type) in [
        ("context.json", PTAType::ObjectSensitive),
        ("static_field.json", PTAType::CallSiteSensitive),
        ("recursion.json", PTAType::CallSiteSensitive),
        ("array.json", PTAType::TypeSensitive),
        ("this_call.json", PTAType::Andersen),
        ("interface.json", PTAType::ObjectSensitive),
    ] {
        let acx = load(name, pta_type, 2);
        let result = run_pointer_analysis(&acx);
        let pt_data = result.pt_data();
        for edge in result.pfg().graph().edge_references() {
            let src = match pt_data.get_pts(edge.source()) {
                Some(pts) => pts,
                None => continue,
            };
            let dst = pt_data.get_pts(edge.target());
            assert!(src.iter().all(|obj| dst.map_or(false, |dst| dst.contains(obj))), "{}", name);
        }
    }
}

#[test]
fn variables_belong_to_reachable_methods() {
    let acx = load("virtual_call.json", PTAType::CallSiteSensitive, 1);
    let result = run_pointer_analysis(&acx);
    for node in result.pfg().graph().node_indices() {
        if let Pointer::Var(cid, var) = *result.pfg().node_pointer(node) {
            if result.pt_data().is_empty(node) {
                continue;
            }
            let method = acx.program.var(var).method;
            assert!(result.call_graph().is_reachable(&CSMethodId::new(cid, method)));
        }
    }
}

#[test]
fn context_sensitive_results_refine_andersen() {
    for pta_type in [PTAType::CallSiteSensitive, PTAType::ObjectSensitive, PTAType::TypeSensitive] {
        for name in ["context.json", "virtual_call.json", "static_field.json", "this_call.json"] {
            let ci_acx = load(name, PTAType::Andersen, 1);
            let ci = run_pointer_analysis(&ci_acx);
            let cs_acx = load(name, pta_type, 2);
            let cs = run_pointer_analysis(&cs_acx);
            for (var, _) in cs_acx.program.vars.iter_enumerated() {
                let ci_pts = pts(&ci, var);
                assert!(pts(&cs, var).iter().all(|obj| ci_pts.contains(obj)));
            }
            assert!(cs.reachable_methods().len() <= ci.reachable_methods().len());
        }
    }
}

#[test]
fn results_are_deterministic() {
    let dump = || {
        let acx = load("context.json", PTAType::ObjectSensitive, 2);
        let result = run_pointer_analysis(&acx);
        serde_json::to_string(&JsonResult::from_pta(&result)).unwrap()
    };
    assert_eq!(dump(), dump());
}
