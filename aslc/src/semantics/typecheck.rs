//! Second walk: types and l-value flags on every expression, semantic
//! diagnostics into the collector.
//!
//! Ill-typed subtrees are decorated with the error type, which every
//! predicate treats as compatible; a defect is reported once, at the node
//! that caused it, and never cascades into the parents.

use super::errors::SemErrors;
use ast::tree::*;
use ast::Decorations;
use symtab::SymTable;
use types::{Comparison, TypeId, TypesMgr};

pub fn typecheck(
    program: &Program,
    types: &mut TypesMgr,
    symbols: &mut SymTable,
    decor: &mut Decorations,
    errors: &mut SemErrors,
) {
    let current_fn = types.create_error_ty();
    let mut checker = Checker {
        types,
        symbols,
        decor,
        errors,
        current_fn,
    };
    checker.program(program);
}

struct Checker<'a> {
    types: &'a mut TypesMgr,
    symbols: &'a mut SymTable,
    decor: &'a mut Decorations,
    errors: &'a mut SemErrors,
    current_fn: TypeId,
}

impl Checker<'_> {
    fn program(&mut self, program: &Program) {
        self.symbols.push_this_scope(self.decor.scope(program.id));
        for function in &program.functions {
            self.function(function);
        }
        if self.symbols.no_main_properly_declared(self.types) {
            self.errors.no_main_properly_declared(program.loc);
        }
        self.symbols.pop_scope();
    }

    fn function(&mut self, function: &Function) {
        self.symbols.push_this_scope(self.decor.scope(function.id));
        self.current_fn = self.decor.ty(function.id);
        self.statements(&function.body);
        self.symbols.pop_scope();
    }

    fn statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &Statement) {
        let loc = statement.loc;
        match &statement.kind {
            StmtKind::Assign { target, value } => {
                self.left_expr(target);
                let t1 = self.decor.ty(target.id);
                self.expression(value);
                let t2 = self.decor.ty(value.id);

                if !self.types.is_error_ty(t1) && !self.decor.is_lvalue(target.id) {
                    self.errors.non_referenceable_left_expr(target.loc);
                }
                if !self.types.is_error_ty(t1)
                    && !self.types.is_error_ty(t2)
                    && !self.types.copyable_types(t1, t2)
                {
                    self.errors.incompatible_assignment(loc);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.condition(condition, loc);
                self.statements(then_branch);
                if let Some(else_branch) = else_branch {
                    self.statements(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.condition(condition, loc);
                self.statements(body);
            }
            StmtKind::ProcCall { callee, args } => {
                self.call(callee, args, loc);
            }
            StmtKind::Read { target } => {
                self.left_expr(target);
                let ty = self.decor.ty(target.id);
                if !self.types.is_error_ty(ty)
                    && !self.types.is_primitive_ty(ty)
                    && !self.types.is_function_ty(ty)
                {
                    self.errors.read_write_require_basic(loc);
                }
                if !self.types.is_error_ty(ty) && !self.decor.is_lvalue(target.id) {
                    self.errors.non_referenceable_expression(loc);
                }
            }
            StmtKind::WriteExpr { value } => {
                self.expression(value);
                let ty = self.decor.ty(value.id);
                if !self.types.is_error_ty(ty) && !self.types.is_primitive_ty(ty) {
                    self.errors.read_write_require_basic(loc);
                }
            }
            StmtKind::WriteString { .. } => {}
            StmtKind::Return { value } => {
                let ret = self.types.get_func_return_type(self.current_fn);
                let value_ty = match value {
                    Some(value) => {
                        self.expression(value);
                        self.decor.ty(value.id)
                    }
                    None => self.types.create_void_ty(),
                };
                if !self.types.is_error_ty(value_ty)
                    && !self.types.is_error_ty(ret)
                    && !self.types.copyable_types(ret, value_ty)
                {
                    self.errors.incompatible_return(loc);
                }
            }
            StmtKind::Swap { left, right } => {
                self.left_expr(left);
                let t1 = self.decor.ty(left.id);
                self.left_expr(right);
                let t2 = self.decor.ty(right.id);

                if !self.types.is_error_ty(t1)
                    && !self.types.is_error_ty(t2)
                    && (!self.types.equal_types(t1, t2)
                        || !self.types.is_primitive_ty(t1)
                        || !self.decor.is_lvalue(left.id)
                        || !self.decor.is_lvalue(right.id))
                {
                    self.errors.incompatible_arguments_in_swap(loc);
                }
            }
            StmtKind::Switch {
                subject,
                cases,
                default,
            } => {
                self.expression(subject);
                let t0 = self.decor.ty(subject.id);
                for case in cases {
                    self.expression(&case.value);
                    let ti = self.decor.ty(case.value.id);
                    if !self.types.is_error_ty(t0)
                        && !self.types.is_error_ty(ti)
                        && !self.types.comparable_types(t0, ti, Comparison::Equality)
                    {
                        self.errors.incompatible_value_in_switch(case.value.loc);
                    }
                    self.statements(&case.body);
                }
                if let Some(default) = default {
                    self.statements(default);
                }
            }
        }
    }

    fn condition(&mut self, condition: &Expr, loc: ast::Loc) {
        self.expression(condition);
        let ty = self.decor.ty(condition.id);
        if !self.types.is_error_ty(ty) && !self.types.is_boolean_ty(ty) {
            self.errors.boolean_required(loc);
        }
    }

    /// Shared between the procedure-call statement and the call
    /// expression; returns the callee's resolved type.
    fn call(&mut self, callee: &Ident, args: &[Expr], loc: ast::Loc) -> TypeId {
        self.ident(callee);
        let callee_ty = self.decor.ty(callee.id);

        let mut error = false;
        if !self.types.is_function_ty(callee_ty) && !self.types.is_error_ty(callee_ty) {
            self.errors.is_not_callable(callee.loc, &callee.name);
            error = true;
        }
        if self.types.is_function_ty(callee_ty)
            && self.types.get_num_of_parameters(callee_ty) != args.len()
        {
            self.errors.number_of_parameters(loc, &callee.name);
            error = true;
        }

        for (i, arg) in args.iter().enumerate() {
            self.expression(arg);
            if error || self.types.is_error_ty(callee_ty) {
                continue;
            }
            let param_ty = self.types.get_parameter_type(callee_ty, i);
            let arg_ty = self.decor.ty(arg.id);
            if !self.types.is_error_ty(param_ty)
                && !self.types.is_error_ty(arg_ty)
                && !self.types.equal_types(param_ty, arg_ty)
                && !(self.types.is_float_ty(param_ty) && self.types.is_integer_ty(arg_ty))
            {
                self.errors
                    .incompatible_parameter(arg.loc, i + 1, &callee.name);
            }
        }
        callee_ty
    }

    fn ident(&mut self, ident: &Ident) {
        match self.symbols.find_in_stack(&ident.name) {
            None => {
                self.errors.undeclared_ident(ident.loc, &ident.name);
                self.decor.put_type(ident.id, self.types.create_error_ty());
                // a writable placeholder, so the parents stay quiet
                self.decor.put_is_lvalue(ident.id, true);
            }
            Some(_) => {
                self.decor
                    .put_type(ident.id, self.symbols.get_type(&ident.name));
                self.decor
                    .put_is_lvalue(ident.id, !self.symbols.is_function_class(&ident.name));
            }
        }
    }

    fn left_expr(&mut self, left: &LeftExpr) {
        self.ident(&left.ident);
        let mut ty = self.decor.ty(left.ident.id);
        let mut lvalue = self.decor.is_lvalue(left.ident.id);

        if let Some(index) = &left.index {
            self.expression(index);
            let index_ty = self.decor.ty(index.id);
            let mut valid = !self.types.is_error_ty(ty);

            if !self.types.is_error_ty(ty) && !self.types.is_array_ty(ty) {
                self.errors.non_array_in_array_access(left.ident.loc);
                ty = self.types.create_error_ty();
                lvalue = false;
                valid = false;
            }
            if !self.types.is_error_ty(index_ty) && !self.types.is_integer_ty(index_ty) {
                // the element type is still produced below
                self.errors.non_integer_index_in_array_access(index.loc);
            }
            if valid {
                ty = self.types.get_array_elem_type(ty);
                lvalue = true;
            }
        }

        self.decor.put_type(left.id, ty);
        self.decor.put_is_lvalue(left.id, lvalue);
    }

    fn expression(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(literal) => {
                let ty = match literal.kind {
                    LitKind::Int => self.types.create_integer_ty(),
                    LitKind::Float => self.types.create_float_ty(),
                    LitKind::Char => self.types.create_character_ty(),
                    LitKind::Bool => self.types.create_boolean_ty(),
                };
                self.decor.put_type(expr.id, ty);
                self.decor.put_is_lvalue(expr.id, false);
            }
            ExprKind::Ident(ident) => {
                self.ident(ident);
                self.decor.put_type(expr.id, self.decor.ty(ident.id));
                self.decor
                    .put_is_lvalue(expr.id, self.decor.is_lvalue(ident.id));
            }
            ExprKind::Paren(inner) => {
                self.expression(inner);
                self.decor.put_type(expr.id, self.decor.ty(inner.id));
                self.decor.put_is_lvalue(expr.id, false);
            }
            ExprKind::ArrayIndex { base, index } => {
                self.ident(base);
                let base_ty = self.decor.ty(base.id);
                let lvalue = self.decor.is_lvalue(base.id);

                if !self.types.is_error_ty(base_ty) && !self.types.is_array_ty(base_ty) {
                    self.errors.non_array_in_array_access(base.loc);
                }
                let ty = if self.types.is_array_ty(base_ty) {
                    self.types.get_array_elem_type(base_ty)
                } else {
                    self.types.create_error_ty()
                };
                self.decor.put_type(expr.id, ty);
                self.decor.put_is_lvalue(expr.id, lvalue);

                self.expression(index);
                let index_ty = self.decor.ty(index.id);
                if !self.types.is_error_ty(index_ty) && !self.types.is_integer_ty(index_ty) {
                    self.errors.non_integer_index_in_array_access(index.loc);
                }
            }
            ExprKind::Call { callee, args } => {
                let callee_ty = self.call(callee, args, expr.loc);

                let mut ty = self.types.create_error_ty();
                if self.types.is_function_ty(callee_ty) {
                    let ret = self.types.get_func_return_type(callee_ty);
                    if self.types.is_void_ty(ret) {
                        self.errors.is_not_function(callee.loc, &callee.name);
                    } else {
                        ty = ret;
                    }
                }
                self.decor.put_type(expr.id, ty);
                self.decor.put_is_lvalue(expr.id, false);
            }
            ExprKind::Unary { op, operand } => {
                self.expression(operand);
                let operand_ty = self.decor.ty(operand.id);
                let ty = match op {
                    UnOp::Not => {
                        if !self.types.is_error_ty(operand_ty)
                            && !self.types.is_boolean_ty(operand_ty)
                        {
                            self.errors.incompatible_operator(expr.loc, op);
                        }
                        self.types.create_boolean_ty()
                    }
                    UnOp::Plus | UnOp::Minus => {
                        if !self.types.is_error_ty(operand_ty)
                            && !self.types.is_numeric_ty(operand_ty)
                        {
                            self.errors.incompatible_operator(expr.loc, op);
                        }
                        if self.types.is_numeric_ty(operand_ty) {
                            operand_ty
                        } else {
                            self.types.create_integer_ty()
                        }
                    }
                };
                self.decor.put_type(expr.id, ty);
                self.decor.put_is_lvalue(expr.id, false);
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.expression(lhs);
                let t1 = self.decor.ty(lhs.id);
                self.expression(rhs);
                let t2 = self.decor.ty(rhs.id);

                let ty = if op.is_arithmetic() {
                    if (!self.types.is_error_ty(t1) && !self.types.is_numeric_ty(t1))
                        || (!self.types.is_error_ty(t2) && !self.types.is_numeric_ty(t2))
                    {
                        self.errors.incompatible_operator(expr.loc, op);
                    }
                    // modulo is integer only
                    if *op == Bop::Mod
                        && (self.types.is_float_ty(t1) || self.types.is_float_ty(t2))
                    {
                        self.errors.incompatible_operator(expr.loc, op);
                    }
                    if self.types.is_float_ty(t1) || self.types.is_float_ty(t2) {
                        self.types.create_float_ty()
                    } else {
                        self.types.create_integer_ty()
                    }
                } else if op.is_relational() {
                    let comparison = if op.is_equality() {
                        Comparison::Equality
                    } else {
                        Comparison::Ordering
                    };
                    if !self.types.is_error_ty(t1)
                        && !self.types.is_error_ty(t2)
                        && !self.types.comparable_types(t1, t2, comparison)
                    {
                        self.errors.incompatible_operator(expr.loc, op);
                    }
                    self.types.create_boolean_ty()
                } else {
                    if (!self.types.is_error_ty(t1) && !self.types.is_boolean_ty(t1))
                        || (!self.types.is_error_ty(t2) && !self.types.is_boolean_ty(t2))
                    {
                        self.errors.incompatible_operator(expr.loc, op);
                    }
                    self.types.create_boolean_ty()
                };
                self.decor.put_type(expr.id, ty);
                self.decor.put_is_lvalue(expr.id, false);
            }
        }
    }
}
