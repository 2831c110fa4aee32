pub mod errors;
mod symbols;
mod typecheck;

pub use errors::{ErrorKind, SemError, SemErrors};
pub use symbols::bind;
pub use typecheck::typecheck;

use ast::tree::Program;
use ast::Decorations;
use symtab::SymTable;
use types::TypesMgr;

/// Runs both semantic passes over a freshly parsed program and returns
/// the collected diagnostics.
pub fn check(
    program: &Program,
    types: &mut TypesMgr,
    symbols: &mut SymTable,
    decor: &mut Decorations,
) -> SemErrors {
    let mut errors = SemErrors::new();
    bind(program, types, symbols, decor, &mut errors);
    typecheck(program, types, symbols, decor, &mut errors);
    errors
}
