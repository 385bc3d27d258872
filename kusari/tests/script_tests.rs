//! Acceptance tests: run script snippets through a fresh interpreter and
//! check printed output, final status, and recorded events.
//!
//! Each case is a `(&str script, &[&str] expected_lines)` pair driven by
//! [`check`], or a `(&str script, FatalKind, &str fragment)` triple driven
//! by [`check_fatal`] for scripts that must abort.

use kusari::message::{Code, FatalKind, Message};
use kusari::tracker::Severity;
use kusari::Interp;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn run(script: &str) -> (Message, Vec<String>) {
    let mut interp = Interp::new();
    let m = interp.exec_line(script);
    let out = interp.take_output();
    (m, out)
}

fn check(script: &str, expected: &[&str]) {
    let (m, got) = run(script);
    assert!(
        !m.is_fatal(),
        "\nscript aborted: {:?}: {}\nScript:\n{script}",
        m.code,
        m.detail
    );
    let want: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    assert_eq!(got, want, "\nScript:\n{script}");
}

fn check_fatal(script: &str, kind: FatalKind, fragment: &str) {
    let (m, _) = run(script);
    assert_eq!(
        m.code,
        Code::Fatal(kind),
        "\nScript:\n{script}\ndetail: {}",
        m.detail
    );
    assert!(
        m.detail.contains(fragment),
        "\ndetail {:?} does not mention {fragment:?}\nScript:\n{script}",
        m.detail
    );
}

// ── Printing and literals ─────────────────────────────────────────────────────

#[test]
fn print_string_literal() {
    check(r#"print("hello world")"#, &["hello world"]);
}

#[test]
fn print_numbers() {
    check("print(42)\nprint(2.5)", &["42", "2.5"]);
}

#[test]
fn whole_float_keeps_one_decimal() {
    check("print(1.5 + 0.5)", &["2.0"]);
}

#[test]
fn print_bool_and_null() {
    check("print(true)\nprint(false)\nprint(null)", &["true", "false", "null"]);
}

#[test]
fn print_refuses_array_with_warning() {
    let mut interp = Interp::new();
    let m = interp.exec_line("var a = array(1, 2)\nprint(a)\nprint(\"after\")");
    assert!(!m.is_fatal(), "{:?}: {}", m.code, m.detail);
    assert_eq!(interp.take_output(), ["after"]);
    let events = interp.tracker().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Warning);
    assert_eq!(events[0].detail, "You can't print this object.");
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    check(
        "# leading comment\nprint(1)\n\n# another\nprint(2)",
        &["1", "2"],
    );
}

// ── Expressions ───────────────────────────────────────────────────────────────

#[test]
fn multiplication_binds_tighter_than_addition() {
    check("print(2 + 3 * 4)", &["14"]);
}

#[test]
fn parentheses_group() {
    check("print((2 + 3) * 4)", &["20"]);
}

#[test]
fn subtraction_and_division() {
    check("print(10 - 2 / 2)", &["9"]);
}

#[test]
fn string_concatenation() {
    check(r#"print("foo" + "bar")"#, &["foobar"]);
}

#[test]
fn grouped_comma_list_yields_the_last_value() {
    check("print((1, 2, 3))", &["3"]);
}

#[test]
fn comparisons_yield_bools() {
    check(
        "print(1 < 2)\nprint(2 <= 1)\nprint(3 >= 3)",
        &["true", "false", "true"],
    );
}

#[test]
fn strings_compare_lexicographically() {
    check(
        "print(\"abc\" < \"abd\")\nprint(\"b\" > \"a\")",
        &["true", "true"],
    );
}

#[test]
fn equality_promotes_int_to_float() {
    check("print(1 == 1.0)\nprint(1 != 2)", &["true", "true"]);
}

#[test]
fn division_by_zero_is_fatal() {
    check_fatal("print(1 / 0)", FatalKind::IllegalArguments, "division by zero");
}

#[test]
fn integer_overflow_is_fatal() {
    check_fatal(
        "print(9223372036854775807 + 1)",
        FatalKind::IllegalArguments,
        "integer overflow",
    );
}

#[test]
fn mixed_type_arithmetic_is_fatal() {
    check_fatal(
        r#"print(1 + "x")"#,
        FatalKind::IllegalArguments,
        "cannot apply",
    );
}

// ── Variables and stores ──────────────────────────────────────────────────────

#[test]
fn declare_then_reassign() {
    check("var x = 1\nx = x + 2\nprint(x)", &["3"]);
}

#[test]
fn assignment_to_unbound_name_is_fatal() {
    check_fatal("x = 1", FatalKind::IllegalCall, "object not found");
}

#[test]
fn scalar_stores_copy() {
    check("var a = 1\nvar b = a\nb = 5\nprint(a)", &["1"]);
}

#[test]
fn ref_binds_an_alias() {
    check("var a = 5\nvar b = ref(a)\nb = 7\nprint(a)", &["7"]);
}

// ── Control flow ──────────────────────────────────────────────────────────────

#[test]
fn if_true_runs_region() {
    check("if (1 < 2)\nprint(\"yes\")\nend", &["yes"]);
}

#[test]
fn if_false_skips_region() {
    check("if (2 < 1)\nprint(\"yes\")\nend\nprint(\"after\")", &["after"]);
}

#[test]
fn else_arm_runs_when_head_is_false() {
    check(
        "if (2 < 1)\nprint(\"yes\")\nelse\nprint(\"no\")\nend",
        &["no"],
    );
}

#[test]
fn elif_chain_picks_first_true_arm() {
    check(
        "var x = 2\nif (x == 1)\nprint(\"one\")\nelif (x == 2)\nprint(\"two\")\nelse\nprint(\"many\")\nend",
        &["two"],
    );
}

#[test]
fn taken_arm_skips_later_arms() {
    check(
        "if (true)\nprint(\"a\")\nelif (true)\nprint(\"b\")\nelse\nprint(\"c\")\nend",
        &["a"],
    );
}

#[test]
fn regions_nest() {
    check(
        "var x = 5\nif (x > 0)\nif (x > 3)\nprint(\"big\")\nend\nprint(\"pos\")\nend",
        &["big", "pos"],
    );
}

#[test]
fn while_counts_down() {
    check(
        "var n = 3\nwhile (n > 0)\nprint(n)\nn = n - 1\nend",
        &["3", "2", "1"],
    );
}

#[test]
fn while_false_never_runs() {
    check("while (1 < 0)\nprint(\"no\")\nend\nprint(\"after\")", &["after"]);
}

#[test]
fn for_steps_inclusive() {
    check("for (i, 1, 3)\nprint(i)\nend", &["1", "2", "3"]);
}

#[test]
fn for_with_descending_bounds_is_empty() {
    check("for (i, 3, 1)\nprint(i)\nend\nprint(\"after\")", &["after"]);
}

#[test]
fn for_counter_is_visible_after_the_loop() {
    check("for (i, 1, 3)\nnop(i)\nend\nprint(i)", &["4"]);
}

#[test]
fn loops_nest() {
    check(
        "for (i, 1, 2)\nfor (j, 1, 2)\nprint(i * 10 + j)\nend\nend",
        &["11", "12", "21", "22"],
    );
}

#[test]
fn for_bounds_must_be_integers() {
    check_fatal(
        "for (i, 1, \"x\")\nprint(i)\nend",
        FatalKind::IllegalArguments,
        "bounds must be integers",
    );
}

#[test]
fn quit_stops_the_run() {
    let (m, out) = run("print(1)\nquit()\nprint(2)");
    assert_eq!(m.code, Code::Quit);
    assert_eq!(out, ["1"]);
}

#[test]
fn top_level_return_ends_cleanly_with_value() {
    let (m, out) = run("print(1)\nreturn 42\nprint(2)");
    assert_eq!(m.code, Code::Success);
    assert_eq!(m.value().as_int(), 42);
    assert_eq!(out, ["1"]);
}

// ── Definitions ───────────────────────────────────────────────────────────────

#[test]
fn define_and_call_with_parameter() {
    check(
        "def greet(name)\nprint(\"hello \" + name)\nend\ngreet(\"world\")",
        &["hello world"],
    );
}

#[test]
fn block_return_value_feeds_expressions() {
    check(
        "def add(a, b)\nreturn a + b\nend\nprint(add(2, 3))",
        &["5"],
    );
}

#[test]
fn blocks_recurse() {
    check(
        "def fact(n)\nif (n < 2)\nreturn 1\nend\nreturn n * fact(n - 1)\nend\nprint(fact(5))",
        &["120"],
    );
}

#[test]
fn parameter_count_mismatch_is_fatal() {
    check_fatal(
        "def add(a, b)\nreturn a + b\nend\nprint(add(1))",
        FatalKind::ParameterCountMismatch,
        "expects 2 parameters",
    );
}

#[test]
fn block_locals_do_not_leak() {
    check("def f()\nvar x = 9\nend\nvar x = 1\nf()\nprint(x)", &["1"]);
}

#[test]
fn blocks_read_outer_bindings() {
    check("var x = 1\ndef f()\nprint(x)\nend\nf()", &["1"]);
}

#[test]
fn definitions_nest() {
    check(
        "def outer()\ndef inner()\nprint(\"in\")\nend\nend\nouter()\ninner()",
        &["in"],
    );
}

#[test]
fn definition_in_a_skipped_region_never_registers() {
    check_fatal(
        "if (false)\ndef ghost()\nprint(\"no\")\nend\nend\nghost()",
        FatalKind::IllegalCall,
        "unknown operation",
    );
}

#[test]
fn loop_state_survives_block_calls() {
    check(
        "def show(k)\nif (k > 1)\nprint(k)\nend\nend\nvar i = 0\nwhile (i < 3)\ni = i + 1\nshow(i)\nend",
        &["2", "3"],
    );
}

// ── Arrays and methods ────────────────────────────────────────────────────────

#[test]
fn array_size_and_at() {
    check(
        "var a = array(1, 2, 3)\nprint(a.size())\nprint(a.at(1))",
        &["3", "2"],
    );
}

#[test]
fn at_yields_a_writable_element_alias() {
    check(
        "var a = array(1, 2, 3)\nvar e = a.at(0)\ne = 9\nprint(a.at(0))",
        &["9"],
    );
}

#[test]
fn array_stores_copy_elements() {
    check(
        "var a = array(1)\nvar b = a\nvar e = b.at(0)\ne = 5\nprint(a.at(0))",
        &["1"],
    );
}

#[test]
fn at_out_of_range_is_fatal() {
    check_fatal(
        "var a = array(1)\nprint(a.at(5))",
        FatalKind::IllegalArguments,
        "out of range",
    );
}

#[test]
fn string_size_counts_chars() {
    check("var s = \"hello\"\nprint(s.size())", &["5"]);
}

#[test]
fn method_on_unbound_receiver_is_fatal() {
    check_fatal("print(z.size())", FatalKind::IllegalCall, "object not found");
}

#[test]
fn unknown_method_for_type_is_fatal() {
    check_fatal(
        "var n = 1\nprint(n.size())",
        FatalKind::IllegalCall,
        "no method",
    );
}

// ── Utility operations ────────────────────────────────────────────────────────

#[test]
fn type_names() {
    check(
        "print(type(1))\nprint(type(1.5))\nprint(type(\"x\"))\nprint(type(true))\nprint(type(null))\nprint(type(array(1)))",
        &["int", "float", "string", "bool", "null", "array"],
    );
}

#[test]
fn nop_passes_its_last_operand_through() {
    check("print(nop(1, 2, 3))", &["3"]);
}

#[test]
fn version_reports_the_crate_version() {
    check("print(version())", &[env!("CARGO_PKG_VERSION")]);
}

// ── Parse and sequencing fatals ───────────────────────────────────────────────

#[test]
fn unknown_operation_is_fatal() {
    check_fatal("nosuch(1)", FatalKind::IllegalCall, "unknown operation");
}

#[test]
fn trailing_tokens_are_fatal() {
    check_fatal(
        "print(1) print(2)",
        FatalKind::IllegalSymbol,
        "unexpected token",
    );
}

#[test]
fn unterminated_string_is_fatal() {
    check_fatal(
        "print(\"abc",
        FatalKind::IllegalSymbol,
        "unterminated string",
    );
}

#[test]
fn bare_bang_is_fatal() {
    check_fatal("print(!1)", FatalKind::IllegalSymbol, "malformed operator");
}

#[test]
fn stray_end_is_fatal() {
    check_fatal("end", FatalKind::IllegalSymbol, "'end' without an open region");
}

#[test]
fn unterminated_region_is_fatal() {
    check_fatal(
        "if (true)\nprint(1)",
        FatalKind::IllegalSymbol,
        "unterminated region",
    );
}

#[test]
fn unterminated_definition_is_fatal() {
    check_fatal(
        "def f()\nprint(1)",
        FatalKind::IllegalSymbol,
        "unterminated definition",
    );
}

#[test]
fn fatal_detail_lands_in_the_tracker() {
    let mut interp = Interp::new();
    let m = interp.exec_line("print(1 / 0)");
    assert!(m.is_fatal());
    let events = interp.tracker().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Fatal);
    assert!(events[0].detail.contains("division by zero"));
}

#[test]
fn interpreter_state_survives_a_fatal() {
    let mut interp = Interp::new();
    let m = interp.exec_line("var x = 3\nprint(1 / 0)");
    assert!(m.is_fatal());
    let m = interp.exec_line("print(x)");
    assert!(!m.is_fatal(), "{:?}: {}", m.code, m.detail);
    assert_eq!(interp.take_output(), ["3"]);
}
