//! Boundary conditions and awkward inputs across the whole pipeline.

use bang_drv::{run_source, BangError};

fn run(source: &str) -> Result<String, BangError> {
    let mut out = Vec::new();
    run_source(source, &mut out)?;
    Ok(String::from_utf8(out).expect("output is utf-8"))
}

#[test]
fn test_whitespace_only_source() {
    assert_eq!(run("   \t\n  \n").unwrap(), "");
}

#[test]
fn test_semicolon_only_source() {
    assert_eq!(run(";;;\n;\n").unwrap(), "");
}

#[test]
fn test_deeply_nested_blocks() {
    let mut src = String::new();
    for _ in 0..20 {
        src.push_str("if 1\n");
    }
    src.push_str("print{\"deep\"}\n");
    for _ in 0..20 {
        src.push_str("end\n");
    }
    assert_eq!(run(&src).unwrap(), "deep\n");
}

#[test]
fn test_deeply_nested_expression() {
    let src = format!("print{{{}1{}}}\n", "(".repeat(40), ")".repeat(40));
    assert_eq!(run(&src).unwrap(), "1\n");
}

#[test]
fn test_first_failing_pass_wins() {
    // both a lexer problem (@) and a semantic problem (undefined name):
    // the lexer reports first
    let err = run("x = undefined_name\ny = @\n").unwrap_err();
    assert!(matches!(err, BangError::Lexer(_)));
}

#[test]
fn test_parser_error_beats_semantic_error() {
    let err = run("x = undefined_name\nend\n").unwrap_err();
    assert!(matches!(err, BangError::Parser(_)));
}

#[test]
fn test_comment_only_lines_between_statements() {
    let src = "x = 1\n# interlude\n\n# another\ny = 2\nprint{x + y}\n";
    assert_eq!(run(src).unwrap(), "3\n");
}

#[test]
fn test_negative_zero_bound_loops() {
    assert_eq!(run("for i 0\nprint{i}\nend\nprint{\"done\"}\n").unwrap(), "done\n");
}

#[test]
fn test_while_false_never_runs() {
    assert_eq!(run("while 0\nprint{\"never\"}\nend\n").unwrap(), "");
}

#[test]
fn test_string_with_operators_inside() {
    assert_eq!(run("print{\"a + b == c\"}\n").unwrap(), "a + b == c\n");
}

#[test]
fn test_unicode_identifiers_and_strings() {
    assert_eq!(run("prix = 1\nprint{\"café\", prix}\n").unwrap(), "café 1\n");
}

#[test]
fn test_shadowing_builtin_names() {
    // builtins live in frame 0 like any binding; user code may rebind
    assert_eq!(run("len = 5\nprint{len + 1}\n").unwrap(), "6\n");
}

#[test]
fn test_empty_function_body_returns_zero() {
    // a function body must still be a block; a single no-op line works
    assert_eq!(run("fn f args\n0\nend\nprint{f{}}\n").unwrap(), "0\n");
}

#[test]
fn test_chained_field_and_index_mix() {
    let src = "\
data Node [items]
n = Node{[[1, 2], [3, 4]]}
print{n.items[1][0]}
";
    assert_eq!(run(src).unwrap(), "3\n");
}

#[test]
fn test_error_line_numbers_survive_semicolons() {
    // the failing statement is the third logical line but sits on line 2
    let source = "x = 1\ny = 2; z = boom\n";
    let err = run(source).unwrap_err();
    assert_eq!(err.span().line, 2);
}

#[test]
fn test_scope_frames_always_pop_on_break() {
    // the loop frame's bindings must not survive the break
    let src = "\
for i range{3}
inner = 99
break
end
print{inner}
";
    let err = run(src).unwrap_err();
    assert!(matches!(err, BangError::Semantic(_)));
}
