pub mod args;
pub mod codegen;
pub mod lex;
pub mod parse;
pub mod semantics;

use ast::Decorations;
use semantics::SemErrors;
use symtab::SymTable;
use tcode::Code;
use thiserror::Error;
use types::TypesMgr;

/// How far to drive the pipeline; `None` runs everything.
#[derive(PartialEq, Eq, Copy, Clone, Debug, clap::ValueEnum)]
pub enum CompileStage {
    Lex,
    Parse,
    Check,
}

/// Result of a full compilation: the emitted code (absent when any
/// semantic error was recorded, or when stopped at `Check`) and the
/// collected diagnostics.
#[derive(Debug)]
pub struct Compilation {
    pub code: Option<Code>,
    pub errors: SemErrors,
}

/// Drives lex → parse → bind → typecheck → codegen over one source text.
/// Returns `None` when an early `stage` stopped the pipeline before the
/// semantic passes.
pub fn compile(source: &str, stage: Option<CompileStage>) -> Result<Option<Compilation>, Error> {
    let tokens = lex::tokenize(source)?;
    if stage == Some(CompileStage::Lex) {
        return Ok(None);
    }

    let program = parse::parse(tokens)?;
    if stage == Some(CompileStage::Parse) {
        return Ok(None);
    }

    let mut types = TypesMgr::new();
    let mut symbols = SymTable::new();
    let mut decor = Decorations::new();
    let errors = semantics::check(&program, &mut types, &mut symbols, &mut decor);

    // the generator assumes a well-typed tree, only run it on one
    let code = if errors.is_empty() && stage.is_none() {
        Some(codegen::generate(&program, &types, &mut symbols, &decor))
    } else {
        None
    };

    Ok(Some(Compilation { code, errors }))
}

/// Full pipeline, no stage gating.
pub fn compile_source(source: &str) -> Result<Compilation, Error> {
    match compile(source, None)? {
        Some(compilation) => Ok(compilation),
        None => unreachable!("no stage was requested"),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("lexing: {0}")]
    Lexing(#[from] lex::Error),
    #[error("parsing: {0}")]
    Parsing(#[from] parse::Error),
}
