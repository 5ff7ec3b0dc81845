use ember::{
    ir::interp::{self, OUT_OF_BOUNDS_EXIT_CODE},
    token::{Location, Spanned},
    typecheck,
    unit::{CompilationUnit, Diagnostic},
};
use pretty_assertions::assert_eq;

fn run(src: &str) -> i64 {
    let mut unit = CompilationUnit::new("test", src);
    if let Err(diagnostics) = unit.compile() {
        let rendered: Vec<_> = diagnostics.iter().map(|d| unit.render(d)).collect();
        panic!("program did not compile:\n{}", rendered.join("\n"));
    }
    interp::run(unit.module()).expect("program should not trap")
}

fn type_errors(src: &str) -> Vec<(typecheck::Error, Location)> {
    let mut unit = CompilationUnit::new("test", src);
    let diagnostics = unit.compile().expect_err("program should not compile");
    diagnostics
        .into_iter()
        .map(|diagnostic| match diagnostic {
            Diagnostic::Type(Spanned { loc, inner }) => (inner, loc),
            other => panic!("expected a type error, found {other:?}"),
        })
        .collect()
}

fn render_errors(src: &str) -> Vec<String> {
    let mut unit = CompilationUnit::new("test", src);
    let diagnostics = unit.compile().expect_err("program should not compile");
    diagnostics.iter().map(|d| unit.render(d)).collect()
}

#[test]
fn literal_main_exits_with_its_value() {
    assert_eq!(run("fn main() { 42; }"), 42);
}

#[test]
fn main_returns_sum_of_locals() {
    assert_eq!(run("fn main() { a := 3; b := 4; a + b; }"), 7);
}

#[test]
fn assignment_is_reloaded() {
    assert_eq!(run("fn main() { a := 0; a = 5; a; }"), 5);
}

#[test]
fn tuple_index_out_of_range() {
    let errors = type_errors("fn main() { a := (1,2,3); a.5; }");
    assert!(matches!(
        errors.as_slice(),
        [(typecheck::Error::DotIndexOutOfRange { index: 5, arity: 3 }, loc)]
            if *loc == Location::new(1, 29, 1, 30)
    ));
    assert_eq!(
        render_errors("fn main() { a := (1,2,3); a.5; }"),
        ["1:29..30: tuple index 5 out of range for a tuple of 3 elements\n\
          fn main() { a := (1,2,3); a.5; }\n                            ^"]
    );
}

#[test]
fn no_overload_for_boolean_plus_integer() {
    let errors = type_errors("fn main() { x := true; x + 1; }");
    assert!(matches!(
        errors.as_slice(),
        [(typecheck::Error::OverloadDoesNotExist { .. }, _)]
    ));
    assert_eq!(
        render_errors("fn main() { x := true; x + 1; }"),
        ["1:24..29: no overload of `+` for Boolean and Integer\n\
          fn main() { x := true; x + 1; }\n                       ^^^^^"]
    );
}

#[test]
fn rebinding_in_same_block_is_rejected() {
    let errors = type_errors("fn main() { var x := 1; var x := 2; x; }");
    assert!(matches!(
        errors.as_slice(),
        [(typecheck::Error::NameAlreadyBoundInScope(_), loc)]
            if *loc == Location::new(1, 29, 1, 30)
    ));
}

#[test]
fn out_of_bounds_subscript_exits_with_distinguished_code() {
    assert_eq!(
        run("fn main() { a := [1,2,3]; b := a[5]; b; }"),
        OUT_OF_BOUNDS_EXIT_CODE
    );
}

#[test]
fn function_declarations_cannot_be_reassigned() {
    let errors = type_errors(
        "fn f() -> Integer { 1; } fn g() -> Integer { 2; } fn main() { f = g; f(); }",
    );
    assert!(matches!(
        errors.as_slice(),
        [(typecheck::Error::ValueCannotBeAssigned, _)]
    ));
}

#[test]
fn main_with_parameters_is_rejected() {
    let errors = type_errors("fn main(x: Integer) { 7; }");
    assert!(matches!(
        errors.as_slice(),
        [(typecheck::Error::MainWithParameters, loc)] if *loc == Location::new(1, 4, 1, 8)
    ));
}

#[test]
fn recursion_a_thousand_calls_deep() {
    let src = "
        fn sum(n: Integer) -> Integer { if (n < 1) { 0; } else { n + sum(n - 1); } }
        fn main() { sum(1000) % 256; }
    ";
    assert_eq!(run(src), 500_500 % 256);
}

#[test]
fn call_depth_is_configurable() {
    let src = "
        fn down(n: Integer) -> Integer { if (n < 1) { 0; } else { down(n - 1); } }
        fn main() { down(100); }
    ";
    let mut unit = CompilationUnit::new("test", src);
    unit.compile().unwrap();
    assert_eq!(interp::run_with_max_depth(unit.module(), 200), Ok(0));
    assert_eq!(
        interp::run_with_max_depth(unit.module(), 50),
        Err(interp::Trap::StackOverflow(50))
    );
}

#[test]
fn demos_run() {
    assert_eq!(run(include_str!("../demos/fib.em")), 55);
    assert_eq!(run(include_str!("../demos/slices.em")), 20);
    assert_eq!(run(include_str!("../demos/tuples.em")), 60);
}

#[test]
fn emitted_ir_names_every_function() {
    let mut unit = CompilationUnit::new("demo", include_str!("../demos/fib.em"));
    unit.compile().unwrap();
    let ir = unit.into_module().to_string();
    assert!(ir.contains("@fib"), "{ir}");
    assert!(ir.contains("@main"), "{ir}");
}
