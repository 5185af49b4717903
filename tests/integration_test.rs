//! End-to-end scenarios exercising the full lex → parse → interpret
//! pipeline through the public `run` entry point.

use mathscript::value::Value;
use num_bigint::BigInt;

fn eval(src: &str) -> Value {
    let (value, error) = mathscript::run("<test>", src);
    assert!(error.is_none(), "unexpected error: {}", error.map(|e| e.to_string()).unwrap_or_default());
    value.expect("a value")
}

#[test]
fn operator_precedence_matches_arithmetic_convention() {
    assert_eq!(eval("1 + 2 * 3"), Value::integer(7));
}

#[test]
fn negative_base_with_fractional_exponent_yields_complex_sqrt() {
    let result = eval("(-4) ^ 0.5");
    assert_eq!(result.to_string(), "(0.0 + 2.0i)");
}

#[test]
fn for_loop_step_follows_the_count_formula() {
    // for i = 0 to 10 step 2 visits 0, 2, 4, 6, 8 — five iterations.
    let result = eval("count = 0\nfor i = 0 to 10 step 2 then count = count + 1\ncount");
    assert_eq!(result, Value::integer(5));
}

#[test]
fn recursive_factorial_via_conditional_expression() {
    let result = eval("func fact(n) => if n < 2 then 1 else n * fact(n - 1)\nfact(6)");
    assert_eq!(result, Value::integer(720));
}

#[test]
fn string_repeat_matches_multiplication_semantics() {
    let result = eval("\"ab\" * 3");
    assert_eq!(result, Value::String("ababab".to_string()));
}

#[test]
fn length_reports_characters_and_elements() {
    assert_eq!(eval("length(\"hello\")"), Value::integer(5));
    assert_eq!(eval("length((1, 2, 3))"), Value::integer(3));
}

#[test]
fn closures_observe_writes_made_after_definition() {
    let result = eval("x = 1\nfunc f() => x\nx = 2\nf()");
    assert_eq!(result, Value::integer(2));
}

#[test]
fn comparison_operators_are_total_over_reals() {
    assert_eq!(eval("1 < 2"), Value::Boolean(true));
    assert_eq!(eval("2 < 1"), Value::Boolean(false));
    assert_eq!(eval("1 == 1.0"), Value::Boolean(true));
}

#[test]
fn truthiness_is_the_inverse_of_not() {
    assert_eq!(eval("not 0"), Value::Boolean(true));
    assert_eq!(eval("not 1"), Value::Boolean(false));
    assert_eq!(eval("not \"\""), Value::Boolean(true));
    assert_eq!(eval("not \"x\""), Value::Boolean(false));
}

#[test]
fn integer_arithmetic_stays_exact_for_large_values() {
    let result = eval("2 ^ 100");
    let expected = Value::Integer(BigInt::from(2).pow(100));
    assert_eq!(result, expected);
}

#[test]
fn division_by_zero_is_a_reported_runtime_error() {
    let (value, error) = mathscript::run("<test>", "1 / 0");
    assert!(value.is_none());
    assert!(error.is_some());
    assert!(error.unwrap().to_string().contains("Division by zero"));
}

#[test]
fn while_loop_with_break_and_continue() {
    let result = eval(
        "n = 0\ntotal = 0\nwhile n < 10 then\nn = n + 1\nif n == 5 then continue\nif n == 8 then break\ntotal = total + n\nend\ntotal",
    );
    // 1+2+3+4 (5 skipped) +6+7 = 23, loop stops before adding 8.
    assert_eq!(result, Value::integer(23));
}

#[test]
fn exec_runs_another_file_in_the_same_environment() {
    let dir = std::env::temp_dir();
    let path = dir.join("mathscript_integration_exec_fixture.ms");
    std::fs::write(&path, "shared_from_exec = 41\n").unwrap();

    let script = format!("exec(\"{}\")\nshared_from_exec + 1", path.display().to_string().replace('\\', "\\\\"));
    let result = eval(&script);
    assert_eq!(result, Value::integer(42));

    std::fs::remove_file(&path).ok();
}

#[test]
fn exec_runs_inline_source_when_argument_is_not_an_existing_path() {
    // "not_a_real_path.ms" doesn't exist on disk, so exec falls back to
    // running the string itself as source.
    let result = eval("exec(\"inline_defined = 7\")\ninline_defined + 1");
    assert_eq!(result, Value::integer(8));
}

#[test]
fn exec_on_invalid_inline_source_is_a_runtime_error() {
    let (value, error) = mathscript::run("<test>", "exec(\"+\")");
    assert!(value.is_none());
    assert!(error.is_some());
}

#[test]
fn inf_and_nan_are_seeded_globals() {
    assert_eq!(eval("inf > 1000000").to_string(), "true");
    assert_eq!(eval("nan == nan").to_string(), "false");
    assert_eq!(eval("1 / inf").to_string(), "0.0");
}
