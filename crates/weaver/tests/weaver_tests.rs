//! Integration tests for the Nutmeg weaver.
//!
//! Programs are built as codelet trees, woven into an engine and run.

use nutmeg_common::{Arity, Bundle, Codelet, Node};
use nutmeg_vm::{Catalog, Engine, Runlet, RuntimeError, Value};
use nutmeg_weaver::{evaluate, load_bundle, WeaveError, Weaver};

// ============================================================
// Helper functions
// ============================================================

fn engine() -> Engine {
    Engine::new(Catalog::standard())
}

fn run(codelet: &Codelet) -> Result<Vec<Value>, WeaveError> {
    evaluate(&mut engine(), codelet)
}

fn args(parts: Vec<Codelet>) -> Codelet {
    let n = parts.len();
    Codelet::seq(parts).with_arity(Arity::exactly(n))
}

fn sys2(name: &str, a: Codelet, b: Codelet) -> Codelet {
    Codelet::syscall(name, args(vec![a, b]))
}

fn range(from: i64, to: i64) -> Codelet {
    sys2("[x..<y]", Codelet::int(from), Codelet::int(to))
}

fn node(node: Node) -> Codelet {
    Codelet::new(node)
}

fn binding(lhs: Codelet, rhs: Codelet) -> Codelet {
    node(Node::Binding {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn assign(lhs: Codelet, rhs: Codelet) -> Codelet {
    node(Node::Assign {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn for_loop(query: Codelet) -> Codelet {
    node(Node::For {
        query: Box::new(query),
    })
}

fn in_query(pattern: Codelet, streamable: Codelet, stream_slot: usize) -> Codelet {
    node(Node::In {
        pattern: Box::new(pattern),
        streamable: Box::new(streamable),
        stream_slot,
    })
}

fn do_query(query: Codelet, body: Codelet) -> Codelet {
    node(Node::Do {
        query: Box::new(query),
        body: Box::new(body),
    })
}

fn nonstop() -> Codelet {
    node(Node::Nonstop)
}

fn wuntil(sense: bool, query: Codelet, test: Codelet, result: Codelet) -> Codelet {
    node(Node::Wuntil {
        sense,
        query: Box::new(query),
        test: Box::new(test),
        result: Box::new(result),
    })
}

fn afterwards(query: Codelet, result: Codelet) -> Codelet {
    node(Node::Afterwards {
        query: Box::new(query),
        result: Box::new(result),
    })
}

/// `total = total + by`
fn bump(total: &Codelet, by: Codelet) -> Codelet {
    assign(total.clone(), sys2("+", total.clone(), by))
}

fn bundle(bindings: Vec<(&str, Codelet)>) -> Bundle {
    Bundle {
        bindings: bindings
            .into_iter()
            .map(|(name, codelet)| (name.to_string(), codelet))
            .collect(),
        ..Bundle::default()
    }
}

// ============================================================
// Expressions
// ============================================================

#[test]
fn builtin_addition() {
    let sum = sys2("+", Codelet::int(1), Codelet::int(2));
    assert_eq!(run(&sum), Ok(vec![Value::Int(3)]));
}

#[test]
fn builtin_with_unannotated_arguments() {
    let sum = Codelet::syscall("+", Codelet::seq(vec![Codelet::int(1), Codelet::int(2)]));
    assert_eq!(run(&sum), Ok(vec![Value::Int(3)]));
}

#[test]
fn builtin_with_wrong_argument_count() {
    let sum = Codelet::syscall("+", Codelet::seq(vec![Codelet::int(1)]));
    assert_eq!(
        run(&sum),
        Err(WeaveError::Runtime(RuntimeError::ArityMismatch {
            expected: 2,
            found: 1
        }))
    );
}

#[test]
fn variadic_builtin() {
    let sum = Codelet::syscall(
        "sum",
        Codelet::seq(vec![Codelet::int(1), Codelet::int(2), Codelet::int(3)]),
    );
    assert_eq!(run(&sum), Ok(vec![Value::Int(6)]));
}

#[test]
fn spreading_range_leaves_every_element() {
    let spread = sys2("..<", Codelet::int(0), Codelet::int(3));
    assert_eq!(
        run(&spread),
        Ok(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn if_picks_then() {
    let choice = Codelet::if_then_else(
        Codelet::bool(true),
        Codelet::string("yes"),
        Codelet::string("no"),
    );
    assert_eq!(run(&choice), Ok(vec![Value::from("yes")]));
}

#[test]
fn if_picks_else_on_comparison() {
    let choice = Codelet::if_then_else(
        sys2("<", Codelet::int(5), Codelet::int(2)),
        Codelet::string("yes"),
        Codelet::string("no"),
    );
    assert_eq!(run(&choice), Ok(vec![Value::from("no")]));
}

#[test]
fn and_short_circuits_to_false() {
    let and = node(Node::And {
        lhs: Box::new(Codelet::bool(false)),
        rhs: Box::new(Codelet::string("unused")),
    });
    assert_eq!(run(&and), Ok(vec![Value::Bool(false)]));
}

#[test]
fn and_yields_rhs_when_true() {
    let and = node(Node::And {
        lhs: Box::new(Codelet::bool(true)),
        rhs: Box::new(Codelet::string("rhs")),
    });
    assert_eq!(run(&and), Ok(vec![Value::from("rhs")]));
}

#[test]
fn or_short_circuits_to_true() {
    let or = node(Node::Or {
        lhs: Box::new(Codelet::bool(true)),
        rhs: Box::new(Codelet::string("unused")),
    });
    assert_eq!(run(&or), Ok(vec![Value::Bool(true)]));
}

#[test]
fn char_literal() {
    assert_eq!(run(&Codelet::char('z')), Ok(vec![Value::Char('z')]));
}

// ============================================================
// Calls
// ============================================================

#[test]
fn lambda_called_with_one_argument() {
    let double = Codelet::lambda(
        1,
        1,
        sys2("*", Codelet::local("x", 0), Codelet::int(2)),
    );
    let call = Codelet::call(double, Codelet::int(21));
    assert_eq!(run(&call), Ok(vec![Value::Int(42)]));
}

#[test]
fn lambda_called_with_too_many_arguments() {
    let identity = Codelet::lambda(1, 1, Codelet::local("x", 0));
    let call = Codelet::call(identity, args(vec![Codelet::int(1), Codelet::int(2)]));
    assert_eq!(
        run(&call),
        Err(WeaveError::Runtime(RuntimeError::ArityMismatch {
            expected: 1,
            found: 2
        }))
    );
}

#[test]
fn lambda_returning_several_values() {
    let pair = Codelet::lambda(0, 0, Codelet::seq(vec![Codelet::int(1), Codelet::int(2)]));
    let call = Codelet::call(pair, Codelet::seq(vec![]));
    assert_eq!(run(&call), Ok(vec![Value::Int(1), Value::Int(2)]));
}

#[test]
fn sysfn_called_dynamically() {
    let call = Codelet::call(
        Codelet::sysfn("+"),
        args(vec![Codelet::int(4), Codelet::int(5)]),
    );
    assert_eq!(run(&call), Ok(vec![Value::Int(9)]));
}

#[test]
fn sysfn_called_with_wrong_count() {
    let call = Codelet::call(Codelet::sysfn("+"), Codelet::int(4));
    assert_eq!(
        run(&call),
        Err(WeaveError::Runtime(RuntimeError::ArityMismatch {
            expected: 2,
            found: 1
        }))
    );
}

#[test]
fn calling_an_exhausted_stream() {
    let s = Codelet::local("s", 0);
    let program = Codelet::seq(vec![
        binding(s.clone(), Codelet::syscall("stream", range(0, 1))),
        Codelet::call(s.clone(), Codelet::seq(vec![])),
        Codelet::call(s, Codelet::seq(vec![])),
    ]);
    assert_eq!(
        run(&program),
        Err(WeaveError::Runtime(RuntimeError::StreamExhausted))
    );
}

#[test]
fn callee_must_be_a_single_value() {
    let callee = Codelet::seq(vec![Codelet::sysfn("+"), Codelet::sysfn("-")]);
    let call = Codelet::call(callee, args(vec![Codelet::int(1), Codelet::int(2)]));
    assert_eq!(
        run(&call),
        Err(WeaveError::Runtime(RuntimeError::WrongItemCount {
            expected: 1,
            found: 2
        }))
    );
}

#[test]
fn failed_assertion_keeps_its_culprits() {
    let check = Codelet::syscall(
        "assertTrue",
        args(vec![
            Codelet::bool(false),
            Codelet::string("unit.nutmeg"),
            Codelet::int(42),
        ]),
    );
    let err = run(&check).unwrap_err();
    assert_eq!(
        err,
        WeaveError::Runtime(RuntimeError::AssertionFailed {
            unit: "unit.nutmeg".into(),
            position: "42".into(),
            details: vec![],
        })
    );
    assert_eq!(
        err.culprits(),
        vec![
            ("Unit", "unit.nutmeg".to_string()),
            ("Position", "42".to_string())
        ]
    );
}

// ============================================================
// Loops
// ============================================================

#[test]
fn for_in_sums_a_range() {
    let total = Codelet::local("total", 0);
    let i = Codelet::local("i", 1);
    let program = Codelet::seq(vec![
        binding(total.clone(), Codelet::int(0)),
        for_loop(do_query(in_query(i.clone(), range(0, 3), 2), bump(&total, i))),
        total,
    ]);
    assert_eq!(run(&program), Ok(vec![Value::Int(3)]));
}

#[test]
fn for_in_over_a_list() {
    let total = Codelet::local("total", 0);
    let i = Codelet::local("i", 1);
    let list = Codelet::syscall(
        "newImmutableList",
        Codelet::seq(vec![Codelet::int(10), Codelet::int(20), Codelet::int(30)]),
    );
    let program = Codelet::seq(vec![
        binding(total.clone(), Codelet::int(0)),
        for_loop(do_query(in_query(i.clone(), list, 2), bump(&total, i))),
        total,
    ]);
    assert_eq!(run(&program), Ok(vec![Value::Int(60)]));
}

#[test]
fn for_in_without_body_binds_the_last_element() {
    let i = Codelet::local("i", 0);
    let program = Codelet::seq(vec![for_loop(in_query(i.clone(), range(0, 3), 1)), i]);
    assert_eq!(run(&program), Ok(vec![Value::Int(2)]));
}

#[test]
fn for_in_over_a_number_is_not_iterable() {
    let i = Codelet::local("i", 0);
    let program = for_loop(in_query(i, Codelet::int(7), 1));
    assert_eq!(
        run(&program),
        Err(WeaveError::Runtime(RuntimeError::NotIterable {
            found: "7".into()
        }))
    );
}

#[test]
fn nested_loops() {
    let total = Codelet::local("total", 0);
    let inner = for_loop(do_query(
        in_query(Codelet::local("j", 3), range(0, 3), 4),
        bump(&total, Codelet::int(1)),
    ));
    let outer = for_loop(do_query(
        in_query(Codelet::local("i", 1), range(0, 3), 2),
        inner,
    ));
    let program = Codelet::seq(vec![binding(total.clone(), Codelet::int(0)), outer, total]);
    assert_eq!(run(&program), Ok(vec![Value::Int(9)]));
}

#[test]
fn no_placeholders_survive_weaving() {
    let total = Codelet::local("total", 0);
    let inner = for_loop(do_query(
        in_query(Codelet::local("j", 3), range(0, 3), 4),
        bump(&total, Codelet::int(1)),
    ));
    let outer = for_loop(do_query(
        in_query(Codelet::local("i", 1), range(0, 3), 2),
        inner,
    ));
    let program = Codelet::seq(vec![binding(total.clone(), Codelet::int(0)), outer, total]);

    let mut engine = engine();
    let function = Weaver::new(engine.weaving_parts())
        .weave_function(0, program.local_slot_count(), &program, None)
        .unwrap();
    let graph = engine.graph();
    let reachable = graph.reachable(function);
    assert!(reachable.len() > 10);
    assert!(reachable
        .iter()
        .all(|id| !matches!(graph[*id], Runlet::Placeholder { .. })));
}

#[test]
fn while_loop_with_result() {
    let n = Codelet::local("n", 0);
    let program = Codelet::seq(vec![
        binding(n.clone(), Codelet::int(0)),
        for_loop(wuntil(
            true,
            do_query(nonstop(), bump(&n, Codelet::int(1))),
            sys2("<", n.clone(), Codelet::int(5)),
            n.clone(),
        )),
    ]);
    assert_eq!(run(&program), Ok(vec![Value::Int(5)]));
}

#[test]
fn until_loop_with_result() {
    let n = Codelet::local("n", 0);
    let program = Codelet::seq(vec![
        binding(n.clone(), Codelet::int(0)),
        for_loop(wuntil(
            false,
            do_query(nonstop(), bump(&n, Codelet::int(1))),
            sys2(">=", n.clone(), Codelet::int(3)),
            Codelet::string("stopped"),
        )),
        n,
    ]);
    assert_eq!(
        run(&program),
        Ok(vec![Value::from("stopped"), Value::Int(3)])
    );
}

#[test]
fn while_loop_stops_before_exhaustion() {
    let i = Codelet::local("i", 0);
    let program = for_loop(wuntil(
        true,
        in_query(i.clone(), range(0, 100), 1),
        sys2("<", i.clone(), Codelet::int(4)),
        i,
    ));
    assert_eq!(run(&program), Ok(vec![Value::Int(4)]));
}

#[test]
fn afterwards_runs_on_exhaustion() {
    let total = Codelet::local("total", 0);
    let i = Codelet::local("i", 1);
    let program = Codelet::seq(vec![
        binding(total.clone(), Codelet::int(0)),
        for_loop(afterwards(
            do_query(in_query(i.clone(), range(0, 4), 2), bump(&total, i)),
            total,
        )),
    ]);
    assert_eq!(run(&program), Ok(vec![Value::Int(6)]));
}

#[test]
fn empty_nonstop_loop() {
    assert_eq!(run(&for_loop(nonstop())), Err(WeaveError::EmptyLoop));
}

#[test]
fn nonstop_loop_with_empty_body() {
    let program = for_loop(do_query(nonstop(), Codelet::seq(vec![])));
    assert_eq!(run(&program), Err(WeaveError::EmptyLoop));
}

#[test]
fn for_over_a_literal_is_not_iterable() {
    assert_eq!(
        run(&for_loop(Codelet::int(1))),
        Err(WeaveError::NotIterable { kind: "int" })
    );
}

#[test]
fn bare_query_is_rejected() {
    let query = in_query(Codelet::local("i", 0), range(0, 3), 1);
    assert!(matches!(
        run(&query),
        Err(WeaveError::Unimplemented { .. })
    ));
}

// ============================================================
// Bundles
// ============================================================

const GREETING: &str = r#"{
    "bindings": {
        "greeting": { "kind": "string", "value": "hello", "arity": "1" },
        "answer": {
            "kind": "syscall", "name": "+", "arity": "1",
            "arguments": {
                "kind": "seq", "arity": "2",
                "body": [
                    { "kind": "int", "value": "40", "arity": "1" },
                    { "kind": "int", "value": "2", "arity": "1" }
                ]
            }
        },
        "main": {
            "kind": "lambda", "nargs": 0, "nlocals": 0, "arity": "1",
            "body": {
                "kind": "seq",
                "body": [
                    { "kind": "id", "name": "greeting", "reftype": "get", "scope": "global" },
                    { "kind": "id", "name": "answer", "reftype": "get", "scope": "global" }
                ]
            }
        }
    },
    "commands": ["main"]
}"#;

#[test]
fn bundle_from_json_runs() {
    let bundle = Bundle::from_json(GREETING).unwrap();
    let mut engine = engine();
    load_bundle(&mut engine, &bundle).unwrap();
    let entry = bundle.default_entry_point().unwrap();
    assert_eq!(
        engine.start(entry, &[], false),
        Ok(vec![Value::from("hello"), Value::Int(42)])
    );
}

#[test]
fn constant_entry_point() {
    let bundle = Bundle::from_json(GREETING).unwrap();
    let mut engine = engine();
    load_bundle(&mut engine, &bundle).unwrap();
    assert_eq!(
        engine.start("answer", &[], false),
        Ok(vec![Value::Int(42)])
    );
}

#[test]
fn entry_point_receives_string_arguments() {
    let echo = Codelet::lambda(2, 2, Codelet::seq(vec![Codelet::local("b", 1), Codelet::local("a", 0)]));
    let mut engine = engine();
    load_bundle(&mut engine, &bundle(vec![("echo", echo)])).unwrap();
    let args = vec!["one".to_string(), "two".to_string()];
    assert_eq!(
        engine.start("echo", &args, false),
        Ok(vec![Value::from("two"), Value::from("one")])
    );
}

#[test]
fn functions_may_refer_forward() {
    let is_even = Codelet::lambda(
        1,
        1,
        Codelet::if_then_else(
            sys2("<=", Codelet::local("n", 0), Codelet::int(0)),
            Codelet::bool(true),
            Codelet::call(
                Codelet::global("is_odd"),
                sys2("-", Codelet::local("n", 0), Codelet::int(1)),
            ),
        ),
    );
    let is_odd = Codelet::lambda(
        1,
        1,
        Codelet::if_then_else(
            sys2("<=", Codelet::local("n", 0), Codelet::int(0)),
            Codelet::bool(false),
            Codelet::call(
                Codelet::global("is_even"),
                sys2("-", Codelet::local("n", 0), Codelet::int(1)),
            ),
        ),
    );
    let check = Codelet::call(Codelet::global("is_even"), Codelet::int(7));
    let mut engine = engine();
    load_bundle(
        &mut engine,
        &bundle(vec![("check", check), ("is_even", is_even), ("is_odd", is_odd)]),
    )
    .unwrap();
    assert_eq!(
        engine.start("check", &[], false),
        Ok(vec![Value::Bool(false)])
    );
}

#[test]
fn deep_recursion_does_not_grow_the_host_stack() {
    let n = Codelet::local("n", 0);
    let countdown = Codelet::lambda(
        1,
        1,
        Codelet::if_then_else(
            sys2("<=", n.clone(), Codelet::int(0)),
            Codelet::string("done"),
            Codelet::call(
                Codelet::global("countdown"),
                sys2("-", n, Codelet::int(1)),
            ),
        ),
    );
    let main = Codelet::lambda(
        0,
        0,
        Codelet::call(Codelet::global("countdown"), Codelet::int(1_000_000)),
    );
    let mut engine = engine();
    load_bundle(&mut engine, &bundle(vec![("countdown", countdown), ("main", main)])).unwrap();
    assert_eq!(
        engine.start("main", &[], false),
        Ok(vec![Value::from("done")])
    );
}

#[test]
fn unknown_global_fails_while_loading() {
    let main = Codelet::lambda(0, 0, Codelet::global("missing"));
    assert_eq!(
        load_bundle(&mut engine(), &bundle(vec![("main", main)])),
        Err(WeaveError::UnknownIdentifier {
            name: "missing".into()
        })
    );
}

#[test]
fn loading_twice_reassigns_globals() {
    let b = bundle(vec![("main", Codelet::lambda(0, 0, Codelet::int(1)))]);
    let mut engine = engine();
    load_bundle(&mut engine, &b).unwrap();
    assert_eq!(
        load_bundle(&mut engine, &b),
        Err(WeaveError::Runtime(RuntimeError::GlobalAlreadyAssigned {
            name: "main".into()
        }))
    );
}

#[test]
fn failed_initialiser_is_a_runtime_error() {
    let b = bundle(vec![(
        "broken",
        sys2("+", Codelet::int(1), Codelet::string("x")),
    )]);
    assert!(matches!(
        load_bundle(&mut engine(), &b),
        Err(WeaveError::Runtime(RuntimeError::TypeMismatch { .. }))
    ));
}

#[test]
fn graphviz_of_a_loaded_function() {
    let bundle = Bundle::from_json(GREETING).unwrap();
    let mut engine = engine();
    load_bundle(&mut engine, &bundle).unwrap();
    let dot = engine.to_dot("main").unwrap();
    assert!(dot.starts_with("digraph main {"));
    assert!(dot.contains("Return"));
}

// ============================================================
// Properties
// ============================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn loop_sum_matches_range_sum(from in -20i64..20, to in -20i64..40) {
            let total = Codelet::local("total", 0);
            let i = Codelet::local("i", 1);
            let program = Codelet::seq(vec![
                binding(total.clone(), Codelet::int(0)),
                for_loop(do_query(in_query(i.clone(), range(from, to), 2), bump(&total, i))),
                total,
            ]);
            let expected: i64 = (from..to).sum();
            prop_assert_eq!(run(&program), Ok(vec![Value::Int(expected)]));
        }

        #[test]
        fn variadic_sum_matches(values in proptest::collection::vec(-1000i64..1000, 0..12)) {
            let args = Codelet::seq(values.iter().map(|n| Codelet::int(*n)).collect());
            let expected: i64 = values.iter().sum();
            prop_assert_eq!(run(&Codelet::syscall("sum", args)), Ok(vec![Value::Int(expected)]));
        }
    }
}
