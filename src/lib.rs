use std::sync::Once;

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping each top-level term into an
/// AST.
pub mod parser;

/// The type checker assigns a type to every node of an AST, recording them in
/// a side table.
pub mod typecheck;

/// Code generation lowers a typed AST into the IR.
pub mod codegen;

/// The IR: a typed, block-structured representation of the program, along
/// with its builder, verifier, printer and interpreter.
pub mod ir;

pub mod ast;
pub mod context;
pub mod ops;
pub mod scope;
pub mod token;
pub mod types;
pub mod unit;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

/// Aborts compilation on a broken internal invariant. Malformed input must
/// never reach one of these.
#[macro_export]
macro_rules! ice {
    ($($arg:tt)*) => {
        panic!("internal compiler error: {}", format_args!($($arg)*))
    };
}

static TRACING_INIT: Once = Once::new();

/// Installs a `tracing` subscriber filtered by `RUST_LOG`. Does nothing if
/// `RUST_LOG` is not set, or on calls after the first.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
