use proptest::prelude::*;

use hades::script::expr::{split_list, tokenize};
use hades::script::Interpreter;
use hades::Value;

proptest! {
    /// The tokenizer returns Ok or Err for any input, never panics.
    #[test]
    fn tokenizer_does_not_panic(s in "\\PC*") {
        let _ = tokenize(&s);
    }

    /// Same for the statement runner: every line is either executed or
    /// rejected with a diagnostic.  Unbounded loops are left out of the
    /// alphabet so every run terminates.
    #[test]
    fn executor_does_not_panic(
        s in "((echo|set|var|const|if|elseif|else|end|foreach|namespace) |[$a-c0-9+*/()='\\[\\],.:\\n -]){0,30}"
    ) {
        let mut interp = Interpreter::new();
        let _ = interp.execute(&s);
    }

    /// `a + b * c` groups as `a + (b * c)`.
    #[test]
    fn multiplication_binds_tighter(a in -1000i64..1000, b in -1000i64..1000, c in -1000i64..1000) {
        let mut interp = Interpreter::new();
        let flat = interp.evaluate(&format!("{a} + {b} * {c}")).unwrap();
        let grouped = interp.evaluate(&format!("{a} + ({b} * {c})")).unwrap();
        prop_assert_eq!(flat, grouped);
    }

    /// `a - b - c` is left-associative.
    #[test]
    fn subtraction_is_left_associative(a in -1000i64..1000, b in -1000i64..1000, c in -1000i64..1000) {
        let mut interp = Interpreter::new();
        let flat = interp.evaluate(&format!("{a} - {b} - {c}")).unwrap();
        prop_assert_eq!(flat, Value::Number((a - b - c) as f64));
    }

    /// `a ^ b ^ c` is right-associative.
    #[test]
    fn power_is_right_associative(a in 1i64..4, b in 0i64..3, c in 0i64..3) {
        let mut interp = Interpreter::new();
        let flat = interp.evaluate(&format!("{a} ^ {b} ^ {c}")).unwrap();
        let grouped = interp.evaluate(&format!("{a} ^ ({b} ^ {c})")).unwrap();
        prop_assert_eq!(flat, grouped);
    }

    /// Comparisons sit below arithmetic.
    #[test]
    fn comparison_below_arithmetic(a in -100i64..100, b in -100i64..100) {
        let mut interp = Interpreter::new();
        let v = interp.evaluate(&format!("{a} + 1 > {b} * 2")).unwrap();
        prop_assert_eq!(v, Value::Bool(a + 1 > b * 2));
    }

    /// Splitting a list of plain words gives the words back, trimmed.
    #[test]
    fn split_list_plain_words(words in prop::collection::vec("[a-z0-9]{1,8}", 1..8)) {
        let joined = words.join(" , ");
        prop_assert_eq!(split_list(&joined).unwrap(), words);
    }

    /// Quoted commas do not split.
    #[test]
    fn split_list_respects_quotes(word in "[a-z]{1,5}") {
        let src = format!("'{word},{word}', 2");
        let parts = split_list(&src).unwrap();
        prop_assert_eq!(parts, vec![format!("'{word},{word}'"), "2".to_owned()]);
    }
}

#[test]
fn negative_literals_in_formulas() {
    let mut interp = Interpreter::new();
    assert_eq!(interp.evaluate("3 - -2").unwrap(), Value::Number(5.0));
}
