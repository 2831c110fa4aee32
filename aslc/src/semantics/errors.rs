//! Append-only collector for the semantic diagnostics of a compilation.
//!
//! Binding and type checking push into it; nothing is reported until the
//! driver drains it after the checks have run.

use ast::Loc;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("identifier '{0}' is already declared")]
    DeclaredIdent(String),
    #[error("identifier '{0}' is undeclared")]
    UndeclaredIdent(String),
    #[error("incompatible operands for operator '{0}'")]
    IncompatibleOperator(String),
    #[error("incompatible types in assignment")]
    IncompatibleAssignment,
    #[error("incompatible type in return statement")]
    IncompatibleReturn,
    #[error("incompatible type for parameter {0} in call to '{1}'")]
    IncompatibleParameter(usize, String),
    #[error("left-hand expression cannot be referenced")]
    NonReferenceableLeftExpr,
    #[error("expression cannot be referenced")]
    NonReferenceableExpression,
    #[error("a boolean condition is required")]
    BooleanRequired,
    #[error("read and write require a basic type")]
    ReadWriteRequireBasic,
    #[error("accessed expression is not an array")]
    NonArrayInArrayAccess,
    #[error("array index is not an integer")]
    NonIntegerIndexInArrayAccess,
    #[error("identifier '{0}' is not callable")]
    IsNotCallable(String),
    #[error("function '{0}' does not return a value")]
    IsNotFunction(String),
    #[error("wrong number of parameters in call to '{0}'")]
    NumberOfParameters(String),
    #[error("swap requires two referenceable operands of the same basic type")]
    IncompatibleArgumentsInSwap,
    #[error("case value is incompatible with the switch expression")]
    IncompatibleValueInSwitch,
    #[error("there is no 'main' function with no parameters and no return type")]
    NoMainProperlyDeclared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemError {
    pub loc: Loc,
    pub kind: ErrorKind,
}

impl Display for SemError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} error: {}", self.loc, self.kind)
    }
}

#[derive(Debug, Default)]
pub struct SemErrors(Vec<SemError>);

impl SemErrors {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, loc: Loc, kind: ErrorKind) {
        self.0.push(SemError { loc, kind });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SemError> {
        self.0.iter()
    }

    pub fn declared_ident(&mut self, loc: Loc, name: &str) {
        self.push(loc, ErrorKind::DeclaredIdent(name.to_owned()));
    }

    pub fn undeclared_ident(&mut self, loc: Loc, name: &str) {
        self.push(loc, ErrorKind::UndeclaredIdent(name.to_owned()));
    }

    pub fn incompatible_operator(&mut self, loc: Loc, op: impl ToString) {
        self.push(loc, ErrorKind::IncompatibleOperator(op.to_string()));
    }

    pub fn incompatible_assignment(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::IncompatibleAssignment);
    }

    pub fn incompatible_return(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::IncompatibleReturn);
    }

    pub fn incompatible_parameter(&mut self, loc: Loc, index: usize, callee: &str) {
        self.push(
            loc,
            ErrorKind::IncompatibleParameter(index, callee.to_owned()),
        );
    }

    pub fn non_referenceable_left_expr(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::NonReferenceableLeftExpr);
    }

    pub fn non_referenceable_expression(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::NonReferenceableExpression);
    }

    pub fn boolean_required(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::BooleanRequired);
    }

    pub fn read_write_require_basic(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::ReadWriteRequireBasic);
    }

    pub fn non_array_in_array_access(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::NonArrayInArrayAccess);
    }

    pub fn non_integer_index_in_array_access(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::NonIntegerIndexInArrayAccess);
    }

    pub fn is_not_callable(&mut self, loc: Loc, name: &str) {
        self.push(loc, ErrorKind::IsNotCallable(name.to_owned()));
    }

    pub fn is_not_function(&mut self, loc: Loc, name: &str) {
        self.push(loc, ErrorKind::IsNotFunction(name.to_owned()));
    }

    pub fn number_of_parameters(&mut self, loc: Loc, name: &str) {
        self.push(loc, ErrorKind::NumberOfParameters(name.to_owned()));
    }

    pub fn incompatible_arguments_in_swap(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::IncompatibleArgumentsInSwap);
    }

    pub fn incompatible_value_in_switch(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::IncompatibleValueInSwitch);
    }

    pub fn no_main_properly_declared(&mut self, loc: Loc) {
        self.push(loc, ErrorKind::NoMainProperlyDeclared);
    }
}

impl<'a> IntoIterator for &'a SemErrors {
    type Item = &'a SemError;
    type IntoIter = std::slice::Iter<'a, SemError>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
