use tracing::{debug, instrument};

use crate::{
    ast::Ast,
    codegen,
    context::Context,
    ir::Module,
    parser,
    token::{Location, Spanned},
    typecheck::{self, TypeTable},
    util::fmt::Show,
};

/// An error reported to the user, from any phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    Parse(Spanned<parser::Error>),
    Type(Spanned<typecheck::Error>),
    Codegen(Spanned<codegen::Error>),
}

impl Diagnostic {
    pub fn loc(&self) -> Location {
        match self {
            Diagnostic::Parse(e) => e.loc,
            Diagnostic::Type(e) => e.loc,
            Diagnostic::Codegen(e) => e.loc,
        }
    }
}

/// A single source file on its way to a [`Module`].
///
/// The phases must run in order: [`CompilationUnit::parse_all`], then
/// [`CompilationUnit::typecheck_all`], then [`CompilationUnit::codegen_all`].
/// [`CompilationUnit::compile`] runs all three.
pub struct CompilationUnit {
    source: String,
    cx: Context,
    module: Module,
    terms: Vec<Ast>,
    tables: Vec<TypeTable>,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> CompilationUnit {
        CompilationUnit {
            source: source.into(),
            cx: Context::new(),
            module: Module::new(name),
            terms: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn context(&self) -> &Context {
        &self.cx
    }

    /// The top-level terms parsed so far.
    pub fn terms(&self) -> &[Ast] {
        &self.terms
    }

    /// The type tables of the terms, once typechecked.
    pub fn tables(&self) -> &[TypeTable] {
        &self.tables
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    /// Parses every top-level term. There is no error recovery, so the first
    /// syntax error ends parsing.
    pub fn parse_all(&mut self) -> Result<(), Diagnostic> {
        self.terms = parser::parse_program(&self.source, &mut self.cx).map_err(Diagnostic::Parse)?;
        debug!(terms = self.terms.len(), "parsed");
        Ok(())
    }

    /// Typechecks every term, reporting the errors of all of them. A term
    /// stops being checked at its first error.
    pub fn typecheck_all(&mut self) -> Result<(), Vec<Diagnostic>> {
        let mut tables = Vec::with_capacity(self.terms.len());
        let mut errors = Vec::new();
        for ast in &self.terms {
            match typecheck::check(&mut self.cx, ast) {
                Ok(table) => tables.push(table),
                Err(error) => errors.push(Diagnostic::Type(error)),
            }
        }
        debug!(errors = errors.len(), "typechecked");
        if !errors.is_empty() {
            return Err(errors);
        }
        self.tables = tables;
        Ok(())
    }

    /// Emits the code of every term, in order, stopping at the first error.
    ///
    /// The bindings made while typechecking are dropped first, since codegen
    /// binds every name again, this time to its storage.
    pub fn codegen_all(&mut self) -> Result<(), Diagnostic> {
        self.cx.scopes.reset();
        for (ast, table) in self.terms.iter().zip(&self.tables) {
            codegen::codegen(&mut self.cx, &mut self.module, ast, table)
                .map_err(Diagnostic::Codegen)?;
        }
        debug!(
            functions = self.module.functions.len(),
            globals = self.module.globals.len(),
            "generated code"
        );
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(unit = %self.module.name))]
    pub fn compile(&mut self) -> Result<(), Vec<Diagnostic>> {
        self.parse_all().map_err(|d| vec![d])?;
        self.typecheck_all()?;
        self.codegen_all().map_err(|d| vec![d])
    }

    /// The text of the line where `loc` starts, without its line terminator.
    pub fn extract_source_line(&self, loc: Location) -> &str {
        let index = (loc.first_line as usize).saturating_sub(1);
        self.source.lines().nth(index).unwrap_or("")
    }

    /// Renders a diagnostic as its message followed by the offending line,
    /// underlined with `^` from the first column up to (excluding) the last.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let ctx = self.cx.fmt();
        let message = match diagnostic {
            Diagnostic::Parse(e) => format!("{:#}", e.display(&ctx)),
            Diagnostic::Type(e) => format!("{:#}", e.display(&ctx)),
            Diagnostic::Codegen(e) => format!("{:#}", e.display(&ctx)),
        };
        let loc = diagnostic.loc();
        let line = self.extract_source_line(loc);
        format!("{message}\n{line}\n{}", underline(line, loc))
    }
}

fn underline(line: &str, loc: Location) -> String {
    let start = (loc.first_column as usize).saturating_sub(1);
    // A location spanning several lines is underlined up to the end of its
    // first line.
    let end = if loc.last_line == loc.first_line {
        (loc.last_column as usize).saturating_sub(1)
    } else {
        line.chars().count()
    };
    let width = end.saturating_sub(start).max(1);
    format!("{:start$}{:^<width$}", "", "")
}
