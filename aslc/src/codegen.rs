//! Third walk: lower the decorated tree to three-address code.
//!
//! Expressions produce a `CodeAttribs` triple: the address holding the
//! value, an optional index temporary when that address is indexable, and
//! the instructions that materialize it. Statements produce instruction
//! lists. Temporaries and label suffixes are per-subroutine.

use ast::tree::*;
use ast::Decorations;
use symtab::SymTable;
use tcode::{BinOp, Code, Instruction, InstructionList, IoType, Subroutine, UnOp as TUnOp, ValueType};
use types::{TypeId, TypesMgr};

pub fn generate(
    program: &Program,
    types: &TypesMgr,
    symbols: &mut SymTable,
    decor: &Decorations,
) -> Code {
    let mut codegen = CodeGen {
        types,
        symbols,
        decor,
        counters: CodeCounters::default(),
    };
    codegen.program(program)
}

/// Fresh-name state, reset at the start of every subroutine. `if` and
/// `while` constructs draw their label suffixes from separate counters.
#[derive(Default)]
struct CodeCounters {
    temps: u32,
    if_labels: u32,
    while_labels: u32,
}

impl CodeCounters {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn new_temp(&mut self) -> String {
        self.temps += 1;
        format!("%t{}", self.temps)
    }

    fn new_label_if(&mut self) -> String {
        self.if_labels += 1;
        self.if_labels.to_string()
    }

    fn new_label_while(&mut self) -> String {
        self.while_labels += 1;
        self.while_labels.to_string()
    }
}

/// Result of lowering an expression: where the value lives, the index
/// temporary when the address is indexable, and the code computing it.
struct CodeAttribs {
    addr: String,
    offs: String,
    code: InstructionList,
}

impl CodeAttribs {
    fn new(addr: String) -> Self {
        Self {
            addr,
            offs: String::new(),
            code: InstructionList::new(),
        }
    }
}

struct CodeGen<'a> {
    types: &'a TypesMgr,
    symbols: &'a mut SymTable,
    decor: &'a Decorations,
    counters: CodeCounters,
}

impl CodeGen<'_> {
    fn program(&mut self, program: &Program) -> Code {
        let mut code = Code::new();
        self.symbols.push_this_scope(self.decor.scope(program.id));
        for function in &program.functions {
            code.add_subroutine(self.function(function));
        }
        self.symbols.pop_scope();
        code
    }

    fn function(&mut self, function: &Function) -> Subroutine {
        self.symbols.push_this_scope(self.decor.scope(function.id));
        self.counters.reset();
        let mut subroutine = Subroutine::new(&function.name.name);

        let fn_ty = self.decor.ty(function.id);
        let ret = self.types.get_func_return_type(fn_ty);
        if !self.types.is_void_ty(ret) {
            subroutine.add_param("_result", self.value_type(ret), false);
        }

        for param in &function.params {
            let ty = self.decor.ty(param.id);
            if self.types.is_array_ty(ty) {
                let elem = self.types.get_array_elem_type(ty);
                subroutine.add_param(&param.name.name, self.value_type(elem), true);
            } else {
                subroutine.add_param(&param.name.name, self.value_type(ty), false);
            }
        }

        for decl in &function.decls {
            let ty = self.decor.ty(decl.ty.id);
            let size = self.types.get_size_of_type(ty);
            let elem = if self.types.is_array_ty(ty) {
                self.types.get_array_elem_type(ty)
            } else {
                ty
            };
            for name in &decl.names {
                subroutine.add_var(&name.name, self.value_type(elem), size);
            }
        }

        let mut code = self.statements(&function.body);
        if function.ret.is_none() {
            code.push(Instruction::Return);
        }
        subroutine.set_instructions(code);
        self.symbols.pop_scope();
        subroutine
    }

    fn value_type(&self, ty: TypeId) -> ValueType {
        if self.types.is_integer_ty(ty) {
            ValueType::Int
        } else if self.types.is_boolean_ty(ty) {
            ValueType::Bool
        } else if self.types.is_float_ty(ty) {
            ValueType::Float
        } else if self.types.is_character_ty(ty) {
            ValueType::Char
        } else {
            panic!("no storage type for {}", self.types.to_string(ty))
        }
    }

    fn statements(&mut self, statements: &[Statement]) -> InstructionList {
        let mut code = InstructionList::new();
        for statement in statements {
            code.append(self.statement(statement));
        }
        code
    }

    fn statement(&mut self, statement: &Statement) -> InstructionList {
        match &statement.kind {
            StmtKind::Assign { target, value } => self.assign(target, value),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_stmt(condition, then_branch, else_branch.as_deref()),
            StmtKind::While { condition, body } => self.while_stmt(condition, body),
            StmtKind::ProcCall { callee, args } => self.proc_call(callee, args),
            StmtKind::Read { target } => self.read(target),
            StmtKind::WriteExpr { value } => self.write_expr(value),
            StmtKind::WriteString { text } => {
                InstructionList::new().then(Instruction::WriteString(text.to_string()))
            }
            StmtKind::Return { value } => self.return_stmt(value.as_ref()),
            StmtKind::Swap { left, right } => self.swap(left, right),
            StmtKind::Switch {
                subject,
                cases,
                default,
            } => self.switch(subject, cases, default.as_deref()),
        }
    }

    fn assign(&mut self, target: &LeftExpr, value: &Expr) -> InstructionList {
        let left = self.left_expr(target);
        let t1 = self.decor.ty(target.id);
        let right = self.expression(value);
        let t2 = self.decor.ty(value.id);

        let mut code = left.code;
        code.append(right.code);

        if self.types.is_array_ty(t1) && self.types.is_array_ty(t2) {
            // element-copy loop over the whole array
            let counter = self.counters.new_temp();
            let length = self.counters.new_temp();
            let element = self.counters.new_temp();
            let increment = self.counters.new_temp();
            let compare = self.counters.new_temp();

            let label = self.counters.new_label_while();
            let label_while = format!("while{label}");
            let label_endwhile = format!("endwhile{label}");

            code.extend([
                Instruction::LoadInt {
                    dst: counter.clone(),
                    value: "0".into(),
                },
                Instruction::LoadInt {
                    dst: length.clone(),
                    value: self.types.get_array_size(t1).to_string(),
                },
                Instruction::LoadInt {
                    dst: increment.clone(),
                    value: "1".into(),
                },
                Instruction::Label(label_while.clone()),
                Instruction::Binary {
                    op: BinOp::Lt,
                    dst: compare.clone(),
                    lhs: counter.clone(),
                    rhs: length,
                },
                Instruction::JumpIfFalse {
                    cond: compare,
                    label: label_endwhile.clone(),
                },
                Instruction::LoadIndexed {
                    dst: element.clone(),
                    base: right.addr,
                    index: counter.clone(),
                },
                Instruction::StoreIndexed {
                    base: left.addr,
                    index: counter.clone(),
                    src: element,
                },
                Instruction::Binary {
                    op: BinOp::Add,
                    dst: counter.clone(),
                    lhs: counter,
                    rhs: increment,
                },
                Instruction::Jump(label_while),
                Instruction::Label(label_endwhile),
            ]);
        } else {
            let src = if self.types.is_float_ty(t1) && self.types.is_integer_ty(t2) {
                let temp = self.counters.new_temp();
                code.push(Instruction::Unary {
                    op: TUnOp::Float,
                    dst: temp.clone(),
                    src: right.addr,
                });
                temp
            } else {
                right.addr
            };
            if left.offs.is_empty() {
                code.push(Instruction::Load {
                    dst: left.addr,
                    src,
                });
            } else {
                code.push(Instruction::StoreIndexed {
                    base: left.addr,
                    index: left.offs,
                    src,
                });
            }
        }
        code
    }

    fn if_stmt(
        &mut self,
        condition: &Expr,
        then_branch: &[Statement],
        else_branch: Option<&[Statement]>,
    ) -> InstructionList {
        let cond = self.expression(condition);
        let then_code = self.statements(then_branch);
        let label = self.counters.new_label_if();
        let label_endif = format!("endif{label}");

        let mut code = cond.code;
        match else_branch {
            Some(else_branch) => {
                let label_else = format!("else{label}");
                let else_code = self.statements(else_branch);
                code.push(Instruction::JumpIfFalse {
                    cond: cond.addr,
                    label: label_else.clone(),
                });
                code.append(then_code);
                code.push(Instruction::Jump(label_endif.clone()));
                code.push(Instruction::Label(label_else));
                code.append(else_code);
                code.push(Instruction::Label(label_endif));
            }
            None => {
                code.push(Instruction::JumpIfFalse {
                    cond: cond.addr,
                    label: label_endif.clone(),
                });
                code.append(then_code);
                code.push(Instruction::Label(label_endif));
            }
        }
        code
    }

    fn while_stmt(&mut self, condition: &Expr, body: &[Statement]) -> InstructionList {
        let cond = self.expression(condition);
        let body_code = self.statements(body);
        let label = self.counters.new_label_while();
        let label_begin = format!("beginwhile{label}");
        let label_end = format!("endwhile{label}");

        let mut code = InstructionList::new().then(Instruction::Label(label_begin.clone()));
        code.append(cond.code);
        code.push(Instruction::JumpIfFalse {
            cond: cond.addr,
            label: label_end.clone(),
        });
        code.append(body_code);
        code.push(Instruction::Jump(label_begin));
        code.push(Instruction::Label(label_end));
        code
    }

    /// Shared call sequence: push the return slot, push arguments (with
    /// int-to-float promotion and address-of for local arrays), call, and
    /// pop the arguments again. The return-slot pop differs between the
    /// statement and expression forms.
    fn call_sequence(
        &mut self,
        callee: &Ident,
        args: &[Expr],
        reserve_result: bool,
    ) -> InstructionList {
        let callee_ty = self.decor.ty(callee.id);
        let mut code = InstructionList::new();

        if reserve_result {
            code.push(Instruction::Push(None));
        }

        for (i, arg) in args.iter().enumerate() {
            let attribs = self.expression(arg);
            code.append(attribs.code);
            let mut addr = attribs.addr;

            let param_ty = self.types.get_parameter_type(callee_ty, i);
            let arg_ty = self.decor.ty(arg.id);
            if self.types.is_float_ty(param_ty) && !self.types.is_float_ty(arg_ty) {
                let temp = self.counters.new_temp();
                code.push(Instruction::Unary {
                    op: TUnOp::Float,
                    dst: temp.clone(),
                    src: addr,
                });
                addr = temp;
            } else if self.types.is_array_ty(param_ty) && !self.is_parameter_ident(arg) {
                // local arrays are passed by address
                let temp = self.counters.new_temp();
                code.push(Instruction::LoadAddress {
                    dst: temp.clone(),
                    name: addr,
                });
                addr = temp;
            }
            code.push(Instruction::Push(Some(addr)));
        }

        code.push(Instruction::Call(callee.name.clone()));
        for _ in args {
            code.push(Instruction::Pop(None));
        }
        code
    }

    fn is_parameter_ident(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Ident(ident) => self.symbols.is_parameter_class(&ident.name),
            _ => false,
        }
    }

    fn proc_call(&mut self, callee: &Ident, args: &[Expr]) -> InstructionList {
        let callee_ty = self.decor.ty(callee.id);
        // the slot is reserved even when the result goes unused, the
        // callee stores through it either way
        let reserve = !self.types.is_void_function(callee_ty);
        let mut code = self.call_sequence(callee, args, reserve);
        if reserve {
            code.push(Instruction::Pop(None));
        }
        code
    }

    fn read(&mut self, target: &LeftExpr) -> InstructionList {
        let attribs = self.left_expr(target);
        let ty = self.decor.ty(target.id);
        let mut code = attribs.code;

        let temp = self.counters.new_temp();
        let io = if self.types.is_integer_ty(ty) || self.types.is_boolean_ty(ty) {
            IoType::Int
        } else if self.types.is_float_ty(ty) {
            IoType::Float
        } else if self.types.is_character_ty(ty) {
            IoType::Char
        } else {
            panic!("read on non-basic type {}", self.types.to_string(ty))
        };
        code.push(Instruction::Read {
            ty: io,
            dst: temp.clone(),
        });

        if attribs.offs.is_empty() {
            code.push(Instruction::Load {
                dst: attribs.addr,
                src: temp,
            });
        } else {
            code.push(Instruction::StoreIndexed {
                base: attribs.addr,
                index: attribs.offs,
                src: temp,
            });
        }
        code
    }

    fn write_expr(&mut self, value: &Expr) -> InstructionList {
        let attribs = self.expression(value);
        let ty = self.decor.ty(value.id);
        let mut code = attribs.code;
        let io = if self.types.is_float_ty(ty) {
            IoType::Float
        } else if self.types.is_character_ty(ty) {
            IoType::Char
        } else {
            IoType::Int
        };
        code.push(Instruction::Write {
            ty: io,
            src: attribs.addr,
        });
        code
    }

    fn return_stmt(&mut self, value: Option<&Expr>) -> InstructionList {
        let mut code = InstructionList::new();
        if let Some(value) = value {
            let attribs = self.expression(value);
            code.append(attribs.code);
            code.push(Instruction::Load {
                dst: "_result".into(),
                src: attribs.addr,
            });
        }
        code.then(Instruction::Return)
    }

    fn swap(&mut self, left: &LeftExpr, right: &LeftExpr) -> InstructionList {
        let CodeAttribs {
            addr: addr1,
            offs: offs1,
            code: mut code,
        } = self.left_expr(left);
        let CodeAttribs {
            addr: addr2,
            offs: offs2,
            code: right_code,
        } = self.left_expr(right);
        code.append(right_code);

        let t1 = self.counters.new_temp();
        code.push(read_through(&addr1, &offs1, t1.clone()));
        let t2 = self.counters.new_temp();
        code.push(read_through(&addr2, &offs2, t2.clone()));
        code.push(write_through(&addr1, &offs1, t2));
        code.push(write_through(&addr2, &offs2, t1));
        code
    }

    fn switch(
        &mut self,
        subject: &Expr,
        cases: &[SwitchCase],
        default: Option<&[Statement]>,
    ) -> InstructionList {
        let subject_attribs = self.expression(subject);
        let label_end = format!("endswitch{}", self.counters.new_label_if());
        let mut code = subject_attribs.code;

        for case in cases {
            let value = self.expression(&case.value);
            let temp = self.counters.new_temp();
            let label_next = format!("case{}", self.counters.new_label_if());

            code.append(value.code);
            code.push(Instruction::Binary {
                op: BinOp::Eq,
                dst: temp.clone(),
                lhs: subject_attribs.addr.clone(),
                rhs: value.addr,
            });
            code.push(Instruction::JumpIfFalse {
                cond: temp,
                label: label_next.clone(),
            });
            code.append(self.statements(&case.body));
            code.push(Instruction::Jump(label_end.clone()));
            code.push(Instruction::Label(label_next));
        }

        if let Some(default) = default {
            code.append(self.statements(default));
        }
        code.then(Instruction::Label(label_end))
    }

    fn left_expr(&mut self, left: &LeftExpr) -> CodeAttribs {
        let mut attribs = self.ident(&left.ident);
        if let Some(index) = &left.index {
            let index_attribs = self.expression(index);
            attribs.code.append(index_attribs.code);
            attribs.offs = index_attribs.addr;
        }
        attribs
    }

    fn ident(&mut self, ident: &Ident) -> CodeAttribs {
        let mut attribs = CodeAttribs::new(ident.name.clone());
        let ty = self.decor.ty(ident.id);
        // array parameters hold an address, load through it
        if self.types.is_array_ty(ty) && self.symbols.is_parameter_class(&ident.name) {
            let temp = self.counters.new_temp();
            attribs.code.push(Instruction::Load {
                dst: temp.clone(),
                src: attribs.addr,
            });
            attribs.addr = temp;
        }
        attribs
    }

    fn expression(&mut self, expr: &Expr) -> CodeAttribs {
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal),
            ExprKind::Ident(ident) => self.ident(ident),
            ExprKind::Paren(inner) => self.expression(inner),
            ExprKind::ArrayIndex { base, index } => {
                let mut attribs = self.ident(base);
                let index_attribs = self.expression(index);
                attribs.code.append(index_attribs.code);

                let temp = self.counters.new_temp();
                attribs.code.push(Instruction::LoadIndexed {
                    dst: temp.clone(),
                    base: attribs.addr,
                    index: index_attribs.addr,
                });
                attribs.addr = temp;
                attribs
            }
            ExprKind::Call { callee, args } => {
                let mut code = self.call_sequence(callee, args, true);
                let temp = self.counters.new_temp();
                code.push(Instruction::Pop(Some(temp.clone())));
                CodeAttribs {
                    addr: temp,
                    offs: String::new(),
                    code,
                }
            }
            ExprKind::Unary { op, operand } => self.unary(*op, operand),
            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
        }
    }

    fn literal(&mut self, literal: &Literal) -> CodeAttribs {
        let temp = self.counters.new_temp();
        let instruction = match literal.kind {
            LitKind::Char => Instruction::LoadChar {
                dst: temp.clone(),
                value: literal.text.to_string(),
            },
            LitKind::Float => Instruction::LoadFloat {
                dst: temp.clone(),
                value: literal.text.to_string(),
            },
            LitKind::Bool => Instruction::LoadInt {
                dst: temp.clone(),
                value: if &*literal.text == "true" { "1" } else { "0" }.into(),
            },
            LitKind::Int => Instruction::LoadInt {
                dst: temp.clone(),
                value: literal.text.to_string(),
            },
        };
        let mut attribs = CodeAttribs::new(temp);
        attribs.code.push(instruction);
        attribs
    }

    fn unary(&mut self, op: UnOp, operand: &Expr) -> CodeAttribs {
        let attribs = self.expression(operand);
        if op == UnOp::Plus {
            return attribs;
        }

        let mut code = attribs.code;
        let temp = self.counters.new_temp();
        let op = match op {
            UnOp::Minus => {
                let ty = self.decor.ty(operand.id);
                if self.types.is_float_ty(ty) {
                    TUnOp::Fneg
                } else {
                    TUnOp::Neg
                }
            }
            UnOp::Not => TUnOp::Not,
            UnOp::Plus => unreachable!(),
        };
        code.push(Instruction::Unary {
            op,
            dst: temp.clone(),
            src: attribs.addr,
        });
        CodeAttribs {
            addr: temp,
            offs: String::new(),
            code,
        }
    }

    fn binary(&mut self, op: Bop, lhs: &Expr, rhs: &Expr) -> CodeAttribs {
        let left = self.expression(lhs);
        let t1 = self.decor.ty(lhs.id);
        let right = self.expression(rhs);
        let t2 = self.decor.ty(rhs.id);

        let mut code = left.code;
        code.append(right.code);
        let mut addr1 = left.addr;
        let mut addr2 = right.addr;

        let temp = self.counters.new_temp();
        let float = self.types.is_float_ty(t1) || self.types.is_float_ty(t2);

        if float && (op.is_arithmetic() || op.is_relational()) {
            // promote the integer side
            if !self.types.is_float_ty(t1) {
                let promoted = self.counters.new_temp();
                code.push(Instruction::Unary {
                    op: TUnOp::Float,
                    dst: promoted.clone(),
                    src: addr1,
                });
                addr1 = promoted;
            } else if !self.types.is_float_ty(t2) {
                let promoted = self.counters.new_temp();
                code.push(Instruction::Unary {
                    op: TUnOp::Float,
                    dst: promoted.clone(),
                    src: addr2,
                });
                addr2 = promoted;
            }
        }

        match op {
            Bop::Add | Bop::Sub | Bop::Mul | Bop::Div => {
                let op = match (op, float) {
                    (Bop::Add, false) => BinOp::Add,
                    (Bop::Sub, false) => BinOp::Sub,
                    (Bop::Mul, false) => BinOp::Mul,
                    (Bop::Div, false) => BinOp::Div,
                    (Bop::Add, true) => BinOp::Fadd,
                    (Bop::Sub, true) => BinOp::Fsub,
                    (Bop::Mul, true) => BinOp::Fmul,
                    (Bop::Div, true) => BinOp::Fdiv,
                    _ => unreachable!(),
                };
                code.push(Instruction::Binary {
                    op,
                    dst: temp.clone(),
                    lhs: addr1,
                    rhs: addr2,
                });
            }
            Bop::Mod => {
                assert!(!float, "float modulo must be rejected by the type check");
                // a % b == a - (a / b) * b
                let quotient = self.counters.new_temp();
                let product = self.counters.new_temp();
                code.extend([
                    Instruction::Binary {
                        op: BinOp::Div,
                        dst: quotient.clone(),
                        lhs: addr1.clone(),
                        rhs: addr2.clone(),
                    },
                    Instruction::Binary {
                        op: BinOp::Mul,
                        dst: product.clone(),
                        lhs: quotient,
                        rhs: addr2,
                    },
                    Instruction::Binary {
                        op: BinOp::Sub,
                        dst: temp.clone(),
                        lhs: addr1,
                        rhs: product,
                    },
                ]);
            }
            Bop::Equal | Bop::NotEqual => {
                let eq = if float { BinOp::Feq } else { BinOp::Eq };
                code.push(Instruction::Binary {
                    op: eq,
                    dst: temp.clone(),
                    lhs: addr1,
                    rhs: addr2,
                });
                if op == Bop::NotEqual {
                    code.push(Instruction::Unary {
                        op: TUnOp::Not,
                        dst: temp.clone(),
                        src: temp.clone(),
                    });
                }
            }
            Bop::Less | Bop::Greater | Bop::Leq | Bop::Geq => {
                // > and >= reuse LT and LE with the operands swapped
                let (cmp_op, lhs, rhs) = match (op, float) {
                    (Bop::Less, false) => (BinOp::Lt, addr1, addr2),
                    (Bop::Greater, false) => (BinOp::Lt, addr2, addr1),
                    (Bop::Leq, false) => (BinOp::Le, addr1, addr2),
                    (Bop::Geq, false) => (BinOp::Le, addr2, addr1),
                    (Bop::Less, true) => (BinOp::Flt, addr1, addr2),
                    (Bop::Greater, true) => (BinOp::Flt, addr2, addr1),
                    (Bop::Leq, true) => (BinOp::Fle, addr1, addr2),
                    (Bop::Geq, true) => (BinOp::Fle, addr2, addr1),
                    _ => unreachable!(),
                };
                code.push(Instruction::Binary {
                    op: cmp_op,
                    dst: temp.clone(),
                    lhs,
                    rhs,
                });
            }
            Bop::And | Bop::Or => {
                let op = if op == Bop::And { BinOp::And } else { BinOp::Or };
                code.push(Instruction::Binary {
                    op,
                    dst: temp.clone(),
                    lhs: addr1,
                    rhs: addr2,
                });
            }
        }
        CodeAttribs {
            addr: temp,
            offs: String::new(),
            code,
        }
    }
}

fn read_through(addr: &str, offs: &str, dst: String) -> Instruction {
    if offs.is_empty() {
        Instruction::Load {
            dst,
            src: addr.to_owned(),
        }
    } else {
        Instruction::LoadIndexed {
            dst,
            base: addr.to_owned(),
            index: offs.to_owned(),
        }
    }
}

fn write_through(addr: &str, offs: &str, src: String) -> Instruction {
    if offs.is_empty() {
        Instruction::Load {
            dst: addr.to_owned(),
            src,
        }
    } else {
        Instruction::StoreIndexed {
            base: addr.to_owned(),
            index: offs.to_owned(),
            src,
        }
    }
}
