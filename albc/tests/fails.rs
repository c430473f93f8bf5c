mod common;

use albc::{
    EXIT_LEXER_FAILURE, EXIT_PARSER_FAILURE, EXIT_SYMRES_FAILURE, EXIT_TYPECHECK_FAILURE,
};
use common::fails_with;

#[test]
fn oversized_integer_literals_fail_lexing() {
    fails_with("var x int := 2147483648;", EXIT_LEXER_FAILURE);
}

#[test]
fn unterminated_strings_fail_lexing() {
    fails_with("var s string := \"abc;", EXIT_LEXER_FAILURE);
}

#[test]
fn bare_carriage_return_fails_lexing() {
    fails_with("\rvar x int := 1;", EXIT_LEXER_FAILURE);
}

#[test]
fn stray_equals_fails_lexing() {
    fails_with("var x int := 1 = 1;", EXIT_LEXER_FAILURE);
}

#[test]
fn stray_colon_fails_lexing() {
    fails_with("var x int : 1;", EXIT_LEXER_FAILURE);
}

#[test]
fn illegal_digits_fail_lexing() {
    fails_with("var x int := 0x1g;", EXIT_LEXER_FAILURE);
    fails_with("var x int := 089;", EXIT_LEXER_FAILURE);
}

#[test]
fn missing_expressions_fail_parsing() {
    fails_with("var x int := ;", EXIT_PARSER_FAILURE);
}

#[test]
fn premature_eof_fails_parsing() {
    fails_with("var x int := 1", EXIT_PARSER_FAILURE);
    fails_with("if 1 { return 1;", EXIT_PARSER_FAILURE);
}

#[test]
fn keywords_cannot_open_expressions() {
    fails_with("var x int := if;", EXIT_PARSER_FAILURE);
}

#[test]
fn undefined_variables_fail_resolution() {
    fails_with("x := 1;", EXIT_SYMRES_FAILURE);
    fails_with("var x int := y;", EXIT_SYMRES_FAILURE);
}

#[test]
fn redefinition_in_one_block_fails_resolution() {
    fails_with("var x int := 1; var x int := 2;", EXIT_SYMRES_FAILURE);
    fails_with(
        "fun f int() { return 1; } fun f int() { return 2; }",
        EXIT_SYMRES_FAILURE,
    );
}

#[test]
fn undeclared_functions_fail_resolution() {
    fails_with("f();", EXIT_SYMRES_FAILURE);
    fails_with("g(); fun g void() { return; }", EXIT_SYMRES_FAILURE);
}

#[test]
fn wrong_arity_fails_typechecking() {
    fails_with(
        "fun f int(x int) { return x; } f(1, 2);",
        EXIT_TYPECHECK_FAILURE,
    );
}

#[test]
fn wrong_argument_types_fail_typechecking() {
    fails_with(
        "fun f int(x int) { return x; } f(\"s\");",
        EXIT_TYPECHECK_FAILURE,
    );
}

#[test]
fn bare_return_in_an_int_function_fails_typechecking() {
    fails_with("fun f int() { return; }", EXIT_TYPECHECK_FAILURE);
}

#[test]
fn module_returns_must_be_integers() {
    fails_with("return \"hi\";", EXIT_TYPECHECK_FAILURE);
}

#[test]
fn mixed_type_arithmetic_fails_typechecking() {
    fails_with("var x int := \"a\" + 1;", EXIT_TYPECHECK_FAILURE);
}

#[test]
fn subscripts_fail_typechecking() {
    fails_with("var xs int := 1; var x int := xs[;", EXIT_TYPECHECK_FAILURE);
}

#[test]
fn folding_a_division_by_zero_fails() {
    fails_with("var x int := 1 / 0;", EXIT_TYPECHECK_FAILURE);
    fails_with("var x int := 7 % (3 - 3);", EXIT_TYPECHECK_FAILURE);
}
