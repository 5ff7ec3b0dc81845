use crate::{
    context::Context,
    ir::interp,
    parser,
    token::Spanned,
    typecheck,
    unit::CompilationUnit,
    util::fmt::{tree, Show},
};

pub fn format_errors<E>(cx: &Context, e: &[Spanned<E>]) -> Vec<String>
where
    Spanned<E>: Show,
{
    let ctx = cx.fmt();
    e.iter().map(|e| format!("{:#}", e.display(&ctx))).collect()
}

/// Strips the leading newline and the common indentation of a test source, so
/// that its first line is line 1 and starts at column 1.
pub fn dedent(src: &str) -> String {
    let src = src.strip_prefix('\n').unwrap_or(src);
    let indent = src
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    src.lines()
        .map(|line| line.get(indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    ParserExpr(&'static str),
    CheckerProgram(&'static str),
    RunProgram(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    ExpectedErrors(&'static [&'static str]),
    ExitCode(i64),
}

#[derive(Default)]
pub struct Outcome {
    pub tree: String,
    pub errors: Vec<String>,
    pub exit_code: Option<i64>,
}

#[track_caller]
pub fn run_pipeline(test: Test) -> Outcome {
    let cx = &mut Context::new();

    match test {
        Test::ParserProgram(input) => {
            let input = dedent(input);
            match parser::parse_program(&input, cx) {
                Ok(terms) => Outcome {
                    tree: terms
                        .iter()
                        .map(|ast| tree::print_ast_string(&cx.fmt(), ast, None))
                        .collect(),
                    ..Outcome::default()
                },
                Err(error) => Outcome {
                    errors: format_errors(cx, &[error]),
                    ..Outcome::default()
                },
            }
        }
        Test::ParserExpr(input) => match parser::parse_expr(input, cx) {
            Ok(ast) => Outcome {
                tree: tree::print_ast_string(&cx.fmt(), &ast, None),
                ..Outcome::default()
            },
            Err(error) => Outcome {
                errors: format_errors(cx, &[error]),
                ..Outcome::default()
            },
        },
        Test::CheckerProgram(input) => {
            let input = dedent(input);
            let terms = match parser::parse_program(&input, cx) {
                Ok(terms) => terms,
                Err(error) => {
                    return Outcome {
                        errors: format_errors(cx, &[error]),
                        ..Outcome::default()
                    }
                }
            };
            let mut outcome = Outcome::default();
            let mut errors = Vec::new();
            for ast in &terms {
                match typecheck::check(cx, ast) {
                    Ok(table) => {
                        outcome.tree += &tree::print_ast_string(&cx.fmt(), ast, Some(&table));
                    }
                    Err(error) => errors.push(error),
                }
            }
            outcome.errors = format_errors(cx, &errors);
            outcome
        }
        Test::RunProgram(input) => {
            let input = dedent(input);
            let mut unit = CompilationUnit::new("test", &input);
            match unit.compile() {
                Ok(()) => {
                    let exit_code = interp::run(unit.module())
                        .unwrap_or_else(|trap| panic!("program trapped: {trap}"));
                    Outcome {
                        exit_code: Some(exit_code),
                        ..Outcome::default()
                    }
                }
                Err(diagnostics) => Outcome {
                    errors: diagnostics.iter().map(|d| unit.render(d)).collect(),
                    ..Outcome::default()
                },
            }
        }
    }
}

#[track_caller]
pub fn run_assertion(assertion: Assertion, outcome: &Outcome) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(outcome.errors, expected_errors);
            ::pretty_assertions::assert_eq!(outcome.tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(outcome.errors, expected_errors);
        }
        Assertion::ExitCode(expected) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(outcome.errors, expected_errors);
            ::pretty_assertions::assert_eq!(outcome.exit_code, Some(expected));
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let outcome = crate::util::test_utils::run_pipeline(test);
                tree_tests!(@@expand_assertions, &outcome, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $outcome:expr, []) => {};
    (@@expand_assertions, $outcome:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $outcome,
        );
        tree_tests!(@@expand_assertions, $outcome, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };
    (@@assertion, exit_code, $expected:expr) => {
        crate::util::test_utils::Assertion::ExitCode($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, expr), $source:expr) => {
        crate::util::test_utils::Test::ParserExpr($source)
    };
    (@@get_test(checker, program), $source:expr) => {
        crate::util::test_utils::Test::CheckerProgram($source)
    };
    (@@get_test(run, program), $source:expr) => {
        crate::util::test_utils::Test::RunProgram($source)
    };
}
pub(crate) use tree_tests;
