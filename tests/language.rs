use calc_interpreter::{
    Environment, Error, EvalError, Interpreter, LexError, ParseError, Value, run,
};

fn assert_success(src: &str, expected: Value) {
    let mut env = Environment::new();
    match run(src, &mut env) {
        Ok(Some(value)) => assert_eq!(value, expected, "source: {src}"),
        Ok(None) => panic!("Expected a result for:\n{src}"),
        Err(e) => panic!("Expected success, got error: {e:?}\nSource:\n{src}"),
    }
}

fn assert_error(src: &str) -> Error {
    let mut env = Environment::new();
    match run(src, &mut env) {
        Ok(value) => panic!("Expected an error, got {value:?}\nSource:\n{src}"),
        Err(e) => e,
    }
}

#[test]
fn precedence_and_grouping() {
    assert_success("2 + 3 * 4", Value::Integer(14));
    assert_success("(2 + 3) * 4", Value::Integer(20));
    assert_success("2 * (3 + 4) - -1", Value::Integer(15));
    assert_success("((((7))))", Value::Integer(7));
}

#[test]
fn floor_division() {
    assert_success("7 / 2", Value::Integer(3));
    assert_success("-7 / 2", Value::Integer(-4));
}

#[test]
fn division_by_zero_is_an_eval_error() {
    assert_eq!(assert_error("7 / 0"), Error::Eval(EvalError::DivisionByZero));
}

#[test]
fn variables_across_statements() {
    let mut env = Environment::new();
    assert_eq!(run("x = 5; x + 1", &mut env), Ok(Some(Value::Integer(6))));
    assert_eq!(env.get("x"), Some(&Value::Integer(5)));
}

#[test]
fn undefined_variable_names_the_variable() {
    assert_eq!(
        assert_error("y > 3"),
        Error::Eval(EvalError::UndefinedVariable {
            name: "y".to_string()
        })
    );
}

#[test]
fn comparisons_yield_booleans() {
    assert_success("2 < 3", Value::Boolean(true));
    assert_success("3 != 3", Value::Boolean(false));
    assert_success("x = 2; x > 4", Value::Boolean(false));
    assert_success("1 < 2 < 0", Value::Boolean(true));
}

#[test]
fn unary_chains() {
    assert_success("--5", Value::Integer(5));
    assert_success("-+5", Value::Integer(-5));
    assert_success("- - - 5", Value::Integer(-5));
}

#[test]
fn unmatched_paren_is_a_parse_error() {
    assert!(matches!(
        assert_error("(1 + 2"),
        Error::Parse(ParseError::ExpectedClosingParen { .. })
    ));
}

#[test]
fn stray_characters_are_lex_errors() {
    assert!(matches!(
        assert_error("1 # 2"),
        Error::Lex(LexError::UnexpectedCharacter {
            character: '#',
            position: 2,
            ..
        })
    ));
    assert!(matches!(
        assert_error("1 ! 2"),
        Error::Lex(LexError::UnexpectedCharacter { character: '!', .. })
    ));
}

#[test]
fn lexing_fails_before_anything_runs() {
    let mut env = Environment::new();
    assert!(run("x = 1; @", &mut env).is_err());
    assert!(env.is_empty());
}

#[test]
fn empty_program_has_no_result() {
    let mut env = Environment::new();
    assert_eq!(run("", &mut env), Ok(None));
    assert_eq!(run("   \n", &mut env), Ok(None));
}

#[test]
fn interpreter_keeps_environment_between_runs() {
    let mut interpreter = Interpreter::new();
    assert_eq!(interpreter.run("counter = 1"), Ok(Some(Value::Integer(1))));
    assert_eq!(
        interpreter.run("counter = counter + 1"),
        Ok(Some(Value::Integer(2)))
    );
    assert_eq!(interpreter.run("counter * 10"), Ok(Some(Value::Integer(20))));
    assert_eq!(interpreter.environment().len(), 1);
}

#[test]
fn separate_environments_do_not_interfere() {
    let mut first = Environment::new();
    let mut second = Environment::new();
    run("x = 1", &mut first).unwrap();
    run("x = 2", &mut second).unwrap();
    assert_eq!(run("x", &mut first), Ok(Some(Value::Integer(1))));
    assert_eq!(run("x", &mut second), Ok(Some(Value::Integer(2))));
}

#[test]
fn multiline_programs() {
    let src = "\
width = 12;
height = 5;
area = width * height;
area >= 60
";
    assert_success(src, Value::Boolean(true));
}

#[test]
fn diagnostics_carry_codes() {
    use miette::Diagnostic;

    let code = |src: &str| {
        assert_error(src)
            .code()
            .map(|code| code.to_string())
            .unwrap_or_default()
    };
    assert_eq!(code("1 $"), "calc::lex::unexpected_character");
    assert_eq!(code("1 +"), "calc::parse::unexpected_eof");
    assert_eq!(code("1 / 0"), "calc::eval::division_by_zero");
    assert_eq!(code("z"), "calc::eval::undefined_variable");
}

#[test]
fn interpreter_can_start_from_existing_bindings() {
    let mut env = Environment::new();
    env.assign("limit", Value::Integer(10));
    let mut interpreter = Interpreter::with_environment(env);

    let result = interpreter.run("limit > 3").unwrap();
    assert_eq!(result.and_then(|value| value.as_boolean()), Some(true));
    assert_eq!(
        interpreter.run("limit / 3").unwrap().and_then(|value| value.as_integer()),
        Some(3)
    );
}

#[test]
fn deep_nesting_is_reported_not_fatal() {
    let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    let err = assert_error(&parens);
    assert!(matches!(err, Error::Parse(ParseError::NestingTooDeep { .. })));

    let minuses = format!("{}1", "-".repeat(10_000));
    let err = assert_error(&minuses);
    assert!(matches!(err, Error::Parse(ParseError::NestingTooDeep { .. })));
    assert_eq!(
        miette::Diagnostic::code(&err).map(|code| code.to_string()),
        Some("calc::parse::nesting_too_deep".to_string())
    );
}

#[test]
fn nesting_at_the_limit_evaluates() {
    let depth = calc_interpreter::parse::MAX_DEPTH;
    assert_success(&format!("{}1", "-".repeat(depth)), Value::Integer(1));
    assert_success(
        &format!("{}7{}", "(".repeat(depth), ")".repeat(depth)),
        Value::Integer(7),
    );
}
