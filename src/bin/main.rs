use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use ember::{
    ir::interp::{self, Trap},
    unit::CompilationUnit,
    util::fmt::tree,
};

#[derive(Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
enum Emit {
    /// Nothing; only check the program.
    None,
    /// The typed tree of every top-level term.
    Ast,
    /// The textual IR of the module.
    Ir,
}

/// Compiles an ember program.
#[derive(clap::Parser)]
#[command(name = "emberc", version)]
struct Options {
    /// The source file.
    file: PathBuf,

    /// What to emit once the program compiles.
    #[arg(long, value_enum, default_value = "ir")]
    emit: Emit,

    /// Where to write the emitted output, instead of the standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Interprets `main` and exits with its exit code.
    #[arg(long)]
    run: bool,

    /// Nested calls allowed while interpreting, before the program traps.
    #[arg(long, default_value_t = interp::MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not compile due to {0} previous error(s)")]
    Compile(usize),
    #[error("program trapped: {0}")]
    Trap(#[from] Trap),
}

fn main() -> ExitCode {
    ember::init_tracing();
    let options = Options::parse();
    match run(&options) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: &Options) -> Result<ExitCode, Error> {
    let source = fs::read_to_string(&options.file).map_err(|source| Error::Read {
        path: options.file.clone(),
        source,
    })?;
    let name = options
        .file
        .file_stem()
        .map_or_else(|| "main".to_owned(), |stem| stem.to_string_lossy().into_owned());

    let mut unit = CompilationUnit::new(name, source);
    if let Err(diagnostics) = unit.compile() {
        for diagnostic in &diagnostics {
            eprintln!("{}\n", unit.render(diagnostic));
        }
        return Err(Error::Compile(diagnostics.len()));
    }

    let emitted = match options.emit {
        Emit::None => None,
        Emit::Ast => {
            let ctx = unit.context().fmt();
            let trees = unit
                .terms()
                .iter()
                .zip(unit.tables())
                .map(|(ast, table)| tree::print_ast_string(&ctx, ast, Some(table)))
                .collect::<String>();
            Some(trees)
        }
        Emit::Ir => Some(unit.module().to_string()),
    };
    if let Some(text) = emitted {
        match &options.output {
            Some(path) => fs::write(path, text).map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?,
            None => print!("{text}"),
        }
    }

    if options.run {
        let code = interp::run_with_max_depth(unit.module(), options.max_call_depth)?;
        return Ok(ExitCode::from(code.rem_euclid(256) as u8));
    }
    Ok(ExitCode::SUCCESS)
}
