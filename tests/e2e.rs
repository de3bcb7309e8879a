//! End-to-end tests: run full scripts and assert on captured `say` output.

use parlo::run_script_capture;

fn run(source: &str) -> Vec<String> {
    match run_script_capture(source) {
        Ok(lines) => lines,
        Err(err) => panic!("script failed: {err}\nsource: {source}"),
    }
}

fn run_err(source: &str) -> String {
    match run_script_capture(source) {
        Ok(lines) => panic!("script succeeded with output {lines:?}\nsource: {source}"),
        Err(err) => err,
    }
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(run("let x = 2 + 3 * 4; say x"), ["14"]);
}

#[test]
fn counting_loop() {
    assert_eq!(run("let c = 0; for c < 3 { say c; c += 1 }"), ["0", "1", "2"]);
}

#[test]
fn recursive_fibonacci() {
    let src = "let f = fn : n { if n <= 1 { return n }; return f(n-1) + f(n-2) }; say f(10)";
    assert_eq!(run(src), ["55"]);
}

#[test]
fn closure_captures_defining_scope() {
    let src = "let mk = fn : x { return fn : { return x } }; let g = mk(42); say g()";
    assert_eq!(run(src), ["42"]);
}

#[test]
fn array_index_and_out_of_range() {
    assert_eq!(run("let a = [10, 20, 30]; say a[1]; say a[9]"), ["20", "null"]);
}

#[test]
fn unary_minus_on_string_is_an_error() {
    let err = run_err("let s = \"hi\"; say -s");
    assert!(err.contains("cannot apply \"-\" to STRING"), "got: {err}");
}

#[test]
fn break_exits_one_loop() {
    let src = "\
let i = 0;
for i < 3 {
    let j = 0;
    for j < 3 {
        if j == 1 { break };
        j += 1
    };
    i += 1;
    say i
}";
    assert_eq!(run(src), ["1", "2", "3"]);
}

#[test]
fn continue_skips_to_condition() {
    let src = "let i = 0; let total = 0; for i < 5 { i += 1; if i == 3 { continue }; total += i }; say total";
    assert_eq!(run(src), ["12"]);
}

#[test]
fn return_unwinds_nested_blocks() {
    let src = "let f = fn : { let i = 0; for i < 10 { if i == 3 { return i }; i += 1 } }; say f()";
    assert_eq!(run(src), ["3"]);
}

#[test]
fn function_without_return_yields_null() {
    assert_eq!(run("let f = fn : { 1 + 1 }; say f()"), ["null"]);
}

#[test]
fn break_escaping_function_body_is_an_error() {
    let err = run_err("let f = fn : { break }; f()");
    assert!(err.contains("unexpected callback BREAK"), "got: {err}");
}

#[test]
fn signal_at_top_level_is_an_error() {
    let err = run_err("break");
    assert!(err.contains("unexpected callback BREAK"), "got: {err}");
    let err = run_err("return 1");
    assert!(err.contains("unexpected callback RETURN"), "got: {err}");
}

#[test]
fn integer_arithmetic_stays_integer() {
    assert_eq!(run("say 7 / 2; say 7 % 3"), ["3", "1"]);
}

#[test]
fn mixing_with_float_widens() {
    assert_eq!(run("say 1 + 2.5; say 10.0 / 4"), ["3.500000", "2.500000"]);
}

#[test]
fn division_and_modulo_by_zero() {
    let err = run_err("say 1 / 0");
    assert!(err.contains("division by zero"), "got: {err}");
    let err = run_err("say 1 % 0");
    assert!(err.contains("modulo by zero"), "got: {err}");
}

#[test]
fn unary_operators() {
    assert_eq!(run("say -5; say +5; say !true; say -2.5"), ["-5", "5", "false", "-2.500000"]);
}

#[test]
fn unary_minus_on_bool_is_an_error() {
    let err = run_err("say -true");
    assert!(err.contains("cannot apply \"-\" to BOOLEAN"), "got: {err}");
}

#[test]
fn logical_not_on_number_is_an_error() {
    let err = run_err("say !1");
    assert!(err.contains("cannot apply \"!\" to INTEGER"), "got: {err}");
}

#[test]
fn block_scope_is_not_visible_after_exit() {
    let err = run_err("if true { let x = 1 }; say x");
    assert!(
        err.contains("trying to get uninitialized variable \"x\""),
        "got: {err}"
    );
}

#[test]
fn assignment_mutates_nearest_enclosing_definition() {
    assert_eq!(run("let x = 1; if true { x = 2 }; say x"), ["2"]);
}

#[test]
fn inner_let_shadows_outer() {
    assert_eq!(run("let x = 1; if true { let x = 5; say x }; say x"), ["5", "1"]);
}

#[test]
fn redefinition_in_same_frame_is_an_error() {
    let err = run_err("let a = 1; let a = 2");
    assert!(err.contains("for the second time"), "got: {err}");
}

#[test]
fn assigning_an_undefined_name_is_an_error() {
    let err = run_err("q = 1");
    assert!(
        err.contains("trying to set uninitialized variable \"q\""),
        "got: {err}"
    );
}

#[test]
fn string_concatenation_and_equality() {
    assert_eq!(run("say \"foo\" + \"bar\"; say \"a\" == \"a\"; say \"a\" != \"b\""), ["foobar", "true", "true"]);
}

#[test]
fn string_condition_is_a_coercion_error() {
    let err = run_err("for \"x\" { say 1 }");
    assert!(err.contains("invalid conversion: STRING to BOOLEAN"), "got: {err}");
}

#[test]
fn compound_assignment_operators() {
    assert_eq!(run("let x = 5; x %= 3; say x"), ["2"]);
    assert_eq!(run("let m = 2; m *= 3 + 1; say m"), ["8"]);
    assert_eq!(run("let t = true; t &= false; say t"), ["false"]);
    assert_eq!(run("let t = false; t |= true; say t"), ["true"]);
}

#[test]
fn assignment_yields_the_written_value() {
    assert_eq!(run("let a = 0; let b = (a = 5); say b; say a"), ["5", "5"]);
}

#[test]
fn boolean_operators_do_not_short_circuit() {
    let src = "\
let called = 0;
let f = fn : { called = 1; return true };
say false & f();
say called";
    assert_eq!(run(src), ["false", "1"]);
}

#[test]
fn boolean_operator_on_string_is_an_error() {
    let err = run_err("say true & \"yes\"");
    assert!(err.contains("invalid conversion: STRING to BOOLEAN"), "got: {err}");
}

#[test]
fn let_without_initializer_binds_null() {
    assert_eq!(run("let n; say n; say n == null"), ["null", "true"]);
}

#[test]
fn null_arithmetic_is_an_error() {
    let err = run_err("say 1 + null");
    assert!(err.contains("cannot apply \"+\" to INTEGER and NULL"), "got: {err}");
}

#[test]
fn numeric_equality_promotes() {
    assert_eq!(run("say 1 == 1.0; say 2 > 1.5"), ["true", "true"]);
}

#[test]
fn named_function_defines_itself() {
    assert_eq!(run("fn inc : x { return x + 1 }; say inc(4)"), ["5"]);
}

#[test]
fn lambda_is_a_single_return_function() {
    assert_eq!(run("let add = lambda a, b : a + b; say add(2, 3)"), ["5"]);
    assert_eq!(run("say (lambda : 7)()"), ["7"]);
}

#[test]
fn arity_mismatch_is_an_error() {
    let err = run_err("let f = fn : a, b { return a }; f(1)");
    assert!(err.contains("expected 2 args, found 1"), "got: {err}");
}

#[test]
fn calling_a_non_function_is_an_error() {
    let err = run_err("let x = 1; x(2)");
    assert!(err.contains("cannot call a value of type INTEGER"), "got: {err}");
}

#[test]
fn index_errors() {
    let err = run_err("say 5[0]");
    assert!(err.contains("cannot get index of non-array"), "got: {err}");
    let err = run_err("let a = [1]; say a[0.5]");
    assert!(err.contains("index must be INT"), "got: {err}");
    let err = run_err("let a = [1]; say a[-1]");
    assert!(err.contains("negative index"), "got: {err}");
}

#[test]
fn unterminated_string_is_a_lex_error() {
    let err = run_err("say \"abc");
    assert!(err.contains("unterminated string"), "got: {err}");
}

#[test]
fn float_and_array_rendering() {
    assert_eq!(run("say 2.5"), ["2.500000"]);
    assert_eq!(run("say [1, \"two\", [3]]"), ["[1, two, [3]]"]);
    assert_eq!(run("say fn : {}"), ["function"]);
}

#[test]
fn empty_program_is_fine() {
    assert_eq!(run(""), Vec::<String>::new());
}

#[test]
fn trailing_separators_are_tolerated() {
    assert_eq!(run("say 1;"), ["1"]);
    assert_eq!(run("if true { say 1; }"), ["1"]);
}

#[test]
fn comments_are_skipped() {
    assert_eq!(run("say 1 # trailing comment\n# whole line\n; say 2"), ["1", "2"]);
}

#[test]
fn closures_share_their_captured_frame() {
    let src = "\
let mk = fn : {
    let n = 0;
    return fn : { n += 1; return n }
};
let counter = mk();
say counter();
say counter();
say counter()";
    assert_eq!(run(src), ["1", "2", "3"]);
}

#[test]
fn runtime_error_reports_statement_position() {
    let err = run_err("say 1;\nsay missing");
    assert!(err.contains("at line 2"), "got: {err}");
    assert!(
        err.contains("trying to get uninitialized variable \"missing\""),
        "got: {err}"
    );
}
