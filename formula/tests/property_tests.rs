use formula::script::value::approx_eq;
use formula::script::{Evaluator, Interpreter};
use proptest::prelude::*;

fn same(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

proptest! {
    /// The tokenizer accepts any text; it never panics.
    #[test]
    fn tokenizer_does_not_panic(s in "\\PC*") {
        let ev = Evaluator::new();
        let _ = ev.tokenize(&s);
    }
}

proptest! {
    /// Evaluation returns Ok or Err on arbitrary input, never panics.
    #[test]
    fn evaluator_does_not_panic(s in "\\PC*") {
        let mut ev = Evaluator::new();
        let _ = ev.evaluate(&s);
        let _ = ev.evaluate_boolean(&s);
        let _ = ev.evaluate_with_declarations(&s, true, true);
    }
}

proptest! {
    /// Evaluating cached tokens gives the same answer as evaluating the text.
    #[test]
    fn cached_tokens_match_text(s in "[0-9a-z+*/^%()., -]{0,24}") {
        let ev = Evaluator::new();
        let tokens = ev.tokenize(&s);
        match (ev.evaluate(&s), ev.evaluate_tokens(&tokens)) {
            (Ok(a), Ok(b)) => prop_assert!(same(a, b), "{a} != {b}"),
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "{a:?} vs {b:?}"),
        }
    }
}

proptest! {
    /// Sums of two integers come out exact.
    #[test]
    fn integer_addition(a in -10_000i64..10_000, b in 0i64..10_000) {
        let ev = Evaluator::new();
        let v = ev.evaluate(&format!("{a} + {b}")).unwrap();
        prop_assert!(approx_eq(v, (a + b) as f64), "{a} + {b} = {v}");
    }
}

proptest! {
    /// Every successful boolean evaluation is exactly 0 or 1.
    #[test]
    fn boolean_results_are_truth_values(s in "[0-9x<>=!&| ()]{0,20}") {
        let mut ev = Evaluator::new();
        ev.registry_mut().set_variable("x", 3.0);
        if let Ok(v) = ev.evaluate_boolean(&s) {
            prop_assert!(v == 0.0 || v == 1.0, "{s:?} gave {v}");
        }
    }
}

proptest! {
    /// Comparison against a constant agrees with Rust's own comparison.
    #[test]
    fn comparisons_agree(a in 0i32..1000, b in 0i32..1000) {
        let mut ev = Evaluator::new();
        let lt = ev.evaluate_boolean(&format!("{a} < {b}")).unwrap();
        let ge = ev.evaluate_boolean(&format!("{a} >= {b}")).unwrap();
        prop_assert_eq!(lt == 1.0, a < b);
        prop_assert_eq!(ge == 1.0, a >= b);
    }
}

proptest! {
    /// Scripts of plain assignments end with the last assigned value.
    #[test]
    fn script_result_is_last_line(values in proptest::collection::vec(0u16..1000, 1..8)) {
        let lines: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("let v{i} = {v}"))
            .collect();
        let result = Interpreter::new().run_lines(&lines).unwrap();
        prop_assert_eq!(result, f64::from(*values.last().unwrap()));
    }
}
