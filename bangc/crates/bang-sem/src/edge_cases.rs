//! Edge case tests for bang-sem

#[cfg(test)]
mod tests {
    use bang_lex::Lexer;
    use bang_par::parse_program;

    use crate::{Analyzer, SemanticError};

    fn analyze(source: &str) -> Result<(), SemanticError> {
        let tokens = Lexer::new(source).tokenize().expect("lex failure");
        let roots = parse_program(tokens).expect("parse failure");
        Analyzer::new(&roots).analyze()
    }

    // ==================== EDGE CASES ====================

    #[test]
    fn test_edge_self_referential_update() {
        assert!(analyze("x = 1\nx = x + x").is_ok());
    }

    #[test]
    fn test_edge_use_before_assignment_on_same_line() {
        let err = analyze("x = x + 1").unwrap_err();
        assert!(err.message.contains("variable not initialized"));
    }

    #[test]
    fn test_edge_function_argument_list_is_opaque() {
        // anything done through `args` is dynamic, even nonsense
        assert!(analyze("fn f args\nreturn args[0][1].field + 2\nend").is_ok());
    }

    #[test]
    fn test_edge_function_body_checked_at_declaration() {
        // an undefined name inside a never-called function still fails
        let err = analyze("fn f args\nreturn ghost\nend").unwrap_err();
        assert!(err.message.contains("variable not initialized 'ghost'"));
    }

    #[test]
    fn test_edge_branch_bindings_do_not_merge() {
        // a name bound in only one branch is gone after the if
        let src = "if 1\nx = 1\nelse\nx = 2\nend\nend\nprint{x}";
        let err = analyze(src).unwrap_err();
        assert!(err.message.contains("variable not initialized 'x'"));
    }

    #[test]
    fn test_edge_rebinding_changes_class() {
        // dynamic typing: the same name may hold different classes over
        // time, and checks follow the latest binding
        assert!(analyze("x = 1\nx = \"s\"\ny = x + \"t\"").is_ok());
        let err = analyze("x = 1\nx = \"s\"\ny = x + 1").unwrap_err();
        assert!(err.message.contains("invalid operation"));
    }

    #[test]
    fn test_edge_empty_array_literal_indexing() {
        let err = analyze("x = [][0]").unwrap_err();
        assert!(err.message.contains("index out of bounds"));
    }

    #[test]
    fn test_edge_index_into_nested_literal_strings() {
        assert!(analyze("x = [\"ab\", \"cd\"][1][0]").is_ok());
        let err = analyze("x = [\"ab\"][0][9]").unwrap_err();
        assert!(err.message.contains("index out of bounds"));
    }

    #[test]
    fn test_edge_bool_as_static_index() {
        // true counts as 1
        assert!(analyze("x = [10, 20][true]").is_ok());
        let err = analyze("x = [10][true]").unwrap_err();
        assert!(err.message.contains("index out of bounds"));
    }

    #[test]
    fn test_edge_chain_degrades_at_first_unknown() {
        // m[i] is unknown, so no claim is made about m[i][99]
        assert!(analyze("m = [[1]]\nfor i m\nx = m[i][99]\nend").is_ok());
    }

    #[test]
    fn test_edge_arithmetic_on_chain_result() {
        let err = analyze("m = [[1], \"s\"]\nx = m[1] - 1").unwrap_err();
        assert!(err.message.contains("invalid operation"));
    }

    #[test]
    fn test_edge_exponent_requires_numberlike() {
        assert!(analyze("x = 2 ** true").is_ok());
        let err = analyze("x = 2 ** \"s\"").unwrap_err();
        assert!(err.message.contains("invalid operation"));
    }

    #[test]
    fn test_edge_logic_result_is_opaque() {
        // `&&`/`||` produce an operand, so downstream checks stay quiet
        assert!(analyze("x = 1 && \"s\"\ny = x + 1").is_ok());
    }

    #[test]
    fn test_edge_comparison_result_is_boolean() {
        assert!(analyze("x = 1 < 2\ny = x + 1").is_ok());
        let err = analyze("x = 1 < 2\ny = x + \"s\"").unwrap_err();
        assert!(err.message.contains("invalid operation"));
    }

    #[test]
    fn test_edge_dataclass_shadowing() {
        // rebinding a dataclass name demotes it to whatever came last
        let err = analyze("data P [x]\nP = 5\np = P{1}").unwrap_err();
        assert!(err.message.contains("attempt to call non-function"));
    }

    #[test]
    fn test_edge_instance_field_types_tracked() {
        let err = analyze("data P [x]\np = P{\"s\"}\ny = p.x + 1").unwrap_err();
        assert!(err.message.contains("invalid operation"));
    }

    #[test]
    fn test_edge_instance_through_dynamic_loses_fields() {
        // an instance passed through a call comes back dynamic, so any
        // field name is accepted
        assert!(analyze(
            "data P [x]\nfn id args\nreturn args[0]\nend\np = id{P{1}}\ny = p.whatever"
        )
        .is_ok());
    }

    #[test]
    fn test_edge_set_of_mixed_hashables() {
        assert!(analyze("s = set{1, \"a\", true, none}").is_ok());
    }

    #[test]
    fn test_edge_dict_dynamic_flat_list_unchecked() {
        // a dynamic argument cannot be checked for parity
        assert!(analyze("fn f args\nreturn args[0]\nend\nd = dict{f{}}").is_ok());
    }

    #[test]
    fn test_edge_set_from_dynamic_members() {
        assert!(analyze("fn f args\nreturn 1\nend\ns = set{f{}, f{}}").is_ok());
    }

    #[test]
    fn test_edge_compound_on_loop_variable() {
        assert!(analyze("for i range{3}\ni += 1\nend").is_ok());
    }

    #[test]
    fn test_edge_destructure_rebinding_order() {
        // both names come from the same statically-known array
        assert!(analyze("[a, b] = [1, \"s\"]\nx = a + 1\ny = b + \"t\"").is_ok());
        let err = analyze("[a, b] = [1, \"s\"]\nx = b + 1").unwrap_err();
        assert!(err.message.contains("invalid operation"));
    }

    #[test]
    fn test_edge_while_loop_depth_nesting() {
        let src = "while 1\nwhile 2\nbreak\nend\nbreak\nend";
        assert!(analyze(src).is_ok());
    }

    #[test]
    fn test_edge_return_inside_loop_inside_function() {
        assert!(analyze("fn f args\nfor i range{3}\nreturn i\nend\nreturn 0\nend").is_ok());
    }

    #[test]
    fn test_edge_deep_scope_stack() {
        let mut src = String::from("x = 1\n");
        for _ in 0..50 {
            src.push_str("if x\n");
        }
        src.push_str("y = x\n");
        for _ in 0..50 {
            src.push_str("end\n");
        }
        assert!(analyze(&src).is_ok());
    }
}
