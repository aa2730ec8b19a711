//! End-to-end script behaviour through the public `Interpreter` API.

use std::rc::Rc;

use hades::script::Interpreter;
use hades::{Config, ErrorKind, Level, ScriptError, Value};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Run `src` on a fresh interpreter and return its echo output.
fn output_of(src: &str) -> Vec<String> {
    let mut interp = Interpreter::new();
    if let Err(e) = interp.execute(src) {
        panic!("script failed: {e}\n{:#?}", interp.messages());
    }
    interp.output
}

fn raised(err: ScriptError) -> hades::Message {
    match err {
        ScriptError::Raised(msg) => msg,
        other => panic!("expected a raised error, got {other:?}"),
    }
}

// ── Expressions ───────────────────────────────────────────────────────────────

#[test]
fn precedence_and_implicit_multiplication() {
    let mut i = Interpreter::new();
    assert_eq!(i.evaluate("2 + 3 * 4").unwrap(), Value::Number(14.0));
    assert_eq!(i.evaluate("(2 + 3) * 4").unwrap(), Value::Number(20.0));
    assert_eq!(i.evaluate("2 ^ 3 ^ 2").unwrap(), Value::Number(512.0));
    assert_eq!(i.evaluate("2(3 + 1)").unwrap(), Value::Number(8.0));
    assert_eq!(i.evaluate("-2 ^ 2").unwrap(), Value::Number(-4.0));
}

#[test]
fn comparisons_and_logic() {
    let mut i = Interpreter::new();
    assert_eq!(i.evaluate("(1 < 2) & (3 >= 3)").unwrap(), Value::Bool(true));
    assert_eq!(i.evaluate("1 == 2 | false").unwrap(), Value::Bool(false));
}

#[test]
fn logic_and_comparison_group_left_to_right() {
    let mut i = Interpreter::new();
    // (1 | 0) == 0
    assert_eq!(i.evaluate("1 | 0 == 0").unwrap(), Value::Bool(false));
    assert_eq!(i.evaluate("1 | (0 == 0)").unwrap(), Value::Bool(true));
    // (0 == 0) & 0
    assert_eq!(i.evaluate("0 == 0 & 0").unwrap(), Value::Bool(false));
}

#[test]
fn strings_interpolate_variables() {
    let src = "var $who = 'world'\necho \"hello $who!\"\necho 'no $who here'";
    assert_eq!(output_of(src), vec!["hello world!", "no $who here"]);
}

#[test]
fn escaped_single_quote_inside_double_quotes() {
    assert_eq!(output_of(r#"echo "it\'s""#), vec!["it's"]);
}

#[test]
fn collection_paths() {
    let src = "\
var $p = [name: 'bob', items: [1, 2, 3]]
echo $p.name
echo $p.items.1
set $p.items.1 = 20
echo {array:sum $p.items}";
    assert_eq!(output_of(src), vec!["bob", "2", "24"]);
}

#[test]
fn native_libraries_are_namespaced() {
    let src = "\
echo {math:round 2.567, 2}
echo {string:length 'hades'}
echo {array:join '-', [1, 2, 3]}";
    assert_eq!(output_of(src), vec!["2.57", "5", "1-2-3"]);
}

// ── Blocks ────────────────────────────────────────────────────────────────────

#[test]
fn for_loops_in_both_directions() {
    let src = "\
for $i = 1 to 3
echo $i
end
for $i = 3 to 1
echo $i
end";
    assert_eq!(output_of(src), vec!["1", "2", "3", "3", "2", "1"]);
}

#[test]
fn nested_loops() {
    let src = "\
for $i = 1 to 2
foreach $c in ['a', 'b']
echo $i + $c.value
end
end";
    assert_eq!(output_of(src), vec!["1a", "1b", "2a", "2b"]);
}

#[test]
fn if_chain_only_first_true_branch_runs() {
    let src = "\
var $n = 5
if $n > 10
echo 'big'
elseif $n > 3
echo 'medium'
elseif $n > 1
echo 'small'
else
echo 'tiny'
end";
    assert_eq!(output_of(src), vec!["medium"]);
}

#[test]
fn else_runs_when_nothing_matched() {
    assert_eq!(output_of("if false\necho 1\nelseif false\necho 2\nelse\necho 3\nend"), vec!["3"]);
}

#[test]
fn dangling_else_is_an_error() {
    let mut i = Interpreter::new();
    let msg = raised(i.execute("echo 1\nelse").unwrap_err());
    assert_eq!(msg.kind, Some(ErrorKind::Syntax));
    assert_eq!(msg.line, 2);
    assert_eq!(i.output, vec!["1"]);
}

#[test]
fn unexpected_end_is_an_error() {
    let mut i = Interpreter::new();
    let msg = raised(i.execute("end").unwrap_err());
    assert_eq!(msg.to_string(), format!("ERROR: {} on line 1", ScriptError::UnexpectedBlockEnd));
}

// ── Functions ─────────────────────────────────────────────────────────────────

#[test]
fn recursion() {
    let src = "\
function fact $n
if $n <= 1
return 1
end
return $n * {fact $n - 1}
end
echo {fact 5}";
    assert_eq!(output_of(src), vec!["120"]);
}

#[test]
fn protected_scope_hides_and_restores_locals() {
    let src = "\
var $x = 'caller'
global $g = 0
function bump
var $x = 'callee'
set $g = $g + 1
end
bump
echo $x
echo $g";
    assert_eq!(output_of(src), vec!["caller", "1"]);
}

#[test]
fn parameter_named_like_a_global_writes_the_global() {
    let src = "\
global $g = 1
function show $g
echo $g
end
show 5
echo $g";
    assert_eq!(output_of(src), vec!["5", "5"]);
}

#[test]
fn for_counter_over_a_global_stays_visible_in_calls() {
    let src = "\
global $i = 0
function peek
echo $i
end
for $i = 1 to 2
peek
end";
    assert_eq!(output_of(src), vec!["1", "2"]);
}

#[test]
fn const_declared_in_a_function_outlives_the_call() {
    assert_eq!(output_of("function f\nconst $k = 5\nend\nf\necho $k"), vec!["5"]);
}

#[test]
fn missing_argument_warns_and_binds_null() {
    let mut i = Interpreter::new();
    i.execute("function f $a, $b\nreturn $b\nend\nset $r = {f 1}").unwrap();
    assert_eq!(i.var("r"), Some(Value::Null));
    let msg = &i.messages()[0];
    assert_eq!(msg.level, Level::Warning);
    assert_eq!(msg.kind, Some(ErrorKind::Name));
}

#[test]
fn function_defined_on_inactive_path_does_not_exist() {
    let mut i = Interpreter::new();
    i.execute("if false\nfunction ghost\nend\nend").unwrap();
    assert!(!i.functions.contains("ghost"));
}

#[test]
fn undefined_function_is_an_error() {
    let mut i = Interpreter::new();
    let msg = raised(i.execute("nosuch 1, 2").unwrap_err());
    assert_eq!(msg.kind, Some(ErrorKind::Name));
}

#[test]
fn host_can_call_script_functions() {
    let mut i = Interpreter::new();
    i.execute("function greet $who = 'you'\nreturn 'hi ' + $who\nend").unwrap();
    assert_eq!(i.call("greet", vec![]).unwrap(), Value::from("hi you"));
    assert_eq!(i.call("greet", vec![Value::from("ann")]).unwrap(), Value::from("hi ann"));
}

// ── Variables ─────────────────────────────────────────────────────────────────

#[test]
fn redeclare_is_a_warning() {
    let mut i = Interpreter::new();
    i.execute("var $a = 1\nglobal $a = 2\necho $a").unwrap();
    assert_eq!(i.output, vec!["1"]);
    assert_eq!(i.messages().len(), 1);
    assert_eq!(i.messages()[0].level, Level::Warning);
}

#[test]
fn compound_assignment() {
    let src = "\
var $n = 10, $s = 'ab', $l = [1]
set $n - 4
set $n * 2
set $n / 3
set $s + 'c'
set $l + 2
echo $n
echo $s
echo {array:length $l}";
    assert_eq!(output_of(src), vec!["4", "abc", "2"]);
}

#[test]
fn foreach_sees_appends_made_by_its_body() {
    let src = "\
var $l = [1, 2]
foreach $e in $l
echo $e.value
if $e.value == 1
set $l + 3
end
end";
    assert_eq!(output_of(src), vec!["1", "2", "3"]);
}

#[test]
fn append_after_the_largest_index() {
    let src = "\
var $a = [1]
set $a.9223372036854775807 = 2
set $a + 3
echo {array:length $a}";
    assert_eq!(output_of(src), vec!["3"]);
}

#[test]
fn slice_with_huge_length() {
    assert_eq!(output_of("echo {string:slice 'abc', 1, 10 ^ 30}"), vec!["bc"]);
}

#[test]
fn undefined_variable_aborts() {
    let mut i = Interpreter::new();
    let msg = raised(i.execute("echo 1\necho $missing\necho 2").unwrap_err());
    assert_eq!(msg.line, 2);
    assert_eq!(i.output, vec!["1"]);
}

#[test]
fn undefined_key_is_a_notice() {
    let mut i = Interpreter::new();
    i.execute("var $c = [a: 1]\nset $v = $c.b").unwrap();
    assert_eq!(i.var("v"), Some(Value::Null));
    assert_eq!(i.messages()[0].level, Level::Notice);
}

// ── Modules and policy ────────────────────────────────────────────────────────

#[test]
fn import_defines_into_current_namespace() {
    let mut i = Interpreter::new();
    i.set_loader(Rc::new(|id: &str| match id {
        "shapes" => Ok("function area $w, $h\nreturn $w * $h\nend".to_owned()),
        other => Err(format!("{other}: not found")),
    }));
    i.execute("namespace 'geo'\nimport 'shapes'\nnamespace global\necho {geo:area 3, 4}")
        .unwrap();
    assert_eq!(i.output, vec!["12"]);
}

#[test]
fn eval_runs_generated_code() {
    assert_eq!(output_of("var $cmd = 'echo 7 * 6'\neval $cmd"), vec!["42"]);
}

#[test]
fn keep_going_mode_turns_errors_into_false() {
    let config = Config { throw_errors: false, ..Config::default() };
    let mut i = Interpreter::with_config(config);
    assert_eq!(i.execute("echo 'before'\necho $missing\necho 'after'").unwrap(), Value::Bool(false));
    assert_eq!(i.output, vec!["before"]);
    assert_eq!(i.messages()[0].level, Level::Error);
}

#[test]
fn error_in_function_under_keep_going_returns_false_to_caller() {
    let config = Config { throw_errors: false, ..Config::default() };
    let mut i = Interpreter::with_config(config);
    let src = "function bad\necho $missing\nend\nset $r = {bad}\necho 'continued'";
    i.execute(src).unwrap();
    assert_eq!(i.var("r"), Some(Value::Bool(false)));
    assert_eq!(i.output, vec!["continued"]);
}

#[test]
fn messages_carry_zone_and_line() {
    let mut i = Interpreter::new();
    let _ = i.execute_in("\n\nvar $a = 1\nvar $a = 2", "setup");
    assert_eq!(i.messages()[0].to_string(), format!("WARNING: {} in setup on line 4", ScriptError::Redeclare("a".into())));
}

#[test]
fn unknown_library_is_skipped() {
    let config = Config { libs: vec!["math".into(), "nope".into()], ..Config::default() };
    let i = Interpreter::with_config(config);
    assert!(i.functions.contains("math:sqrt"));
    assert!(!i.functions.contains("string:length"));
}
