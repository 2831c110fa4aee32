//! Three-address virtual instructions and the subroutines that hold them.
//!
//! `Display` renders the conventional listing consumed by the course
//! virtual machine: one instruction per line, opcode followed by its
//! space-separated operands.

use derive_more::{Deref, DerefMut};
use std::fmt::{self, Display, Formatter};

/// Primitive type as recorded on parameters and local variables.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ValueType {
    Int,
    Bool,
    Float,
    Char,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Char => "char",
        })
    }
}

/// Three-operand opcodes: `op dst a b`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Fadd,
    Fsub,
    Fmul,
    Fdiv,
    And,
    Or,
    Eq,
    Lt,
    Le,
    Feq,
    Flt,
    Fle,
}

impl BinOp {
    const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Fadd => "FADD",
            Self::Fsub => "FSUB",
            Self::Fmul => "FMUL",
            Self::Fdiv => "FDIV",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Eq => "EQ",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Feq => "FEQ",
            Self::Flt => "FLT",
            Self::Fle => "FLE",
        }
    }
}

/// Two-operand opcodes: `op dst src`. `Float` is the int-to-float move.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum UnOp {
    Neg,
    Fneg,
    Not,
    Float,
}

impl UnOp {
    const fn mnemonic(self) -> &'static str {
        match self {
            Self::Neg => "NEG",
            Self::Fneg => "FNEG",
            Self::Not => "NOT",
            Self::Float => "FLOAT",
        }
    }
}

/// Which of the typed read/write channels an I/O instruction uses.
/// Booleans travel on the integer channel.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum IoType {
    Int,
    Float,
    Char,
}

impl IoType {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Int => "I",
            Self::Float => "F",
            Self::Char => "C",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Instruction {
    /// ILOAD dst k
    LoadInt { dst: String, value: String },
    /// FLOAD dst k
    LoadFloat { dst: String, value: String },
    /// CHLOAD dst c
    LoadChar { dst: String, value: String },
    /// LOAD dst src
    Load { dst: String, src: String },
    Binary {
        op: BinOp,
        dst: String,
        lhs: String,
        rhs: String,
    },
    Unary {
        op: UnOp,
        dst: String,
        src: String,
    },
    /// LOADX dst base index — indexed read
    LoadIndexed {
        dst: String,
        base: String,
        index: String,
    },
    /// XLOAD base index src — indexed write
    StoreIndexed {
        base: String,
        index: String,
        src: String,
    },
    /// ALOAD dst name — address of a local array
    LoadAddress { dst: String, name: String },
    Label(String),
    /// UJUMP label
    Jump(String),
    /// FJUMP cond label — jump when cond is false
    JumpIfFalse { cond: String, label: String },
    Push(Option<String>),
    Pop(Option<String>),
    Call(String),
    Return,
    Read { ty: IoType, dst: String },
    Write { ty: IoType, src: String },
    /// WRITES "literal" — the operand keeps its quotes
    WriteString(String),
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::LoadInt { dst, value } => write!(f, "ILOAD {dst} {value}"),
            Self::LoadFloat { dst, value } => write!(f, "FLOAD {dst} {value}"),
            Self::LoadChar { dst, value } => write!(f, "CHLOAD {dst} {value}"),
            Self::Load { dst, src } => write!(f, "LOAD {dst} {src}"),
            Self::Binary { op, dst, lhs, rhs } => {
                write!(f, "{} {dst} {lhs} {rhs}", op.mnemonic())
            }
            Self::Unary { op, dst, src } => write!(f, "{} {dst} {src}", op.mnemonic()),
            Self::LoadIndexed { dst, base, index } => write!(f, "LOADX {dst} {base} {index}"),
            Self::StoreIndexed { base, index, src } => write!(f, "XLOAD {base} {index} {src}"),
            Self::LoadAddress { dst, name } => write!(f, "ALOAD {dst} {name}"),
            Self::Label(label) => write!(f, "{label}:"),
            Self::Jump(label) => write!(f, "UJUMP {label}"),
            Self::JumpIfFalse { cond, label } => write!(f, "FJUMP {cond} {label}"),
            Self::Push(Some(v)) => write!(f, "PUSH {v}"),
            Self::Push(None) => f.write_str("PUSH"),
            Self::Pop(Some(v)) => write!(f, "POP {v}"),
            Self::Pop(None) => f.write_str("POP"),
            Self::Call(name) => write!(f, "CALL {name}"),
            Self::Return => f.write_str("RETURN"),
            Self::Read { ty, dst } => write!(f, "READ{} {dst}", ty.suffix()),
            Self::Write { ty, src } => write!(f, "WRITE{} {src}", ty.suffix()),
            Self::WriteString(text) => write!(f, "WRITES {text}"),
        }
    }
}

/// Ordered instruction sequence, built bottom-up by expression lowering.
#[derive(Default, PartialEq, Debug, Deref, DerefMut)]
pub struct InstructionList(Vec<Instruction>);

impl InstructionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chaining push, for the common emit-and-continue shape.
    pub fn then(mut self, instruction: Instruction) -> Self {
        self.0.push(instruction);
        self
    }

    pub fn append(&mut self, mut other: InstructionList) {
        self.0.append(&mut other.0);
    }
}

impl IntoIterator for InstructionList {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a InstructionList {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<Instruction> for InstructionList {
    fn extend<T: IntoIterator<Item = Instruction>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Instruction> for InstructionList {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Param {
    pub name: String,
    pub ty: ValueType,
    /// Array parameters are passed as an address and recorded with their
    /// element type.
    pub by_reference: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LocalVar {
    pub name: String,
    pub ty: ValueType,
    /// 1 for scalars, the declared size for arrays.
    pub size: u32,
}

/// Emitted form of one function.
#[derive(Debug, Default)]
pub struct Subroutine {
    pub name: String,
    pub params: Vec<Param>,
    pub vars: Vec<LocalVar>,
    pub instructions: InstructionList,
}

impl Subroutine {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn add_param(&mut self, name: &str, ty: ValueType, by_reference: bool) {
        self.params.push(Param {
            name: name.to_owned(),
            ty,
            by_reference,
        });
    }

    pub fn add_var(&mut self, name: &str, ty: ValueType, size: u32) {
        self.vars.push(LocalVar {
            name: name.to_owned(),
            ty,
            size,
        });
    }

    pub fn set_instructions(&mut self, instructions: InstructionList) {
        self.instructions = instructions;
    }
}

impl Display for Subroutine {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for p in &self.params {
            let by_ref = if p.by_reference { " ref" } else { "" };
            writeln!(f, "  param {} {}{by_ref}", p.name, p.ty)?;
        }
        for v in &self.vars {
            if v.size > 1 {
                writeln!(f, "  var {} {} {}", v.name, v.ty, v.size)?;
            } else {
                writeln!(f, "  var {} {}", v.name, v.ty)?;
            }
        }
        for instruction in &self.instructions {
            if matches!(instruction, Instruction::Label(_)) {
                writeln!(f, "  {instruction}")?;
            } else {
                writeln!(f, "    {instruction}")?;
            }
        }
        Ok(())
    }
}

/// The whole emitted program: one subroutine per source function.
#[derive(Debug, Default)]
pub struct Code {
    pub subroutines: Vec<Subroutine>,
}

impl Code {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subroutine(&mut self, subroutine: Subroutine) {
        self.subroutines.push(subroutine);
    }

    pub fn get_subroutine(&self, name: &str) -> Option<&Subroutine> {
        self.subroutines.iter().find(|s| s.name == name)
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (i, subroutine) in self.subroutines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{subroutine}")?;
        }
        Ok(())
    }
}
