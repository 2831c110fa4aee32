//! First walk: build scopes and function signatures.
//!
//! One scope per function, created inside the global scope. Statement
//! bodies are not inspected here. Declaration type nodes and function
//! nodes are decorated with the types they denote, function nodes also
//! with their scope.

use super::errors::SemErrors;
use ast::tree::*;
use ast::Decorations;
use symtab::{SymTable, GLOBAL_SCOPE_NAME};
use types::{TypeId, TypesMgr};

pub fn bind(
    program: &Program,
    types: &mut TypesMgr,
    symbols: &mut SymTable,
    decor: &mut Decorations,
    errors: &mut SemErrors,
) {
    let mut binder = Binder {
        types,
        symbols,
        decor,
        errors,
    };
    binder.program(program);
}

struct Binder<'a> {
    types: &'a mut TypesMgr,
    symbols: &'a mut SymTable,
    decor: &'a mut Decorations,
    errors: &'a mut SemErrors,
}

impl Binder<'_> {
    fn program(&mut self, program: &Program) {
        let scope = self.symbols.push_new_scope(GLOBAL_SCOPE_NAME);
        self.decor.put_scope(program.id, scope);
        for function in &program.functions {
            self.function(function);
        }
        self.symbols.pop_scope();
    }

    fn function(&mut self, function: &Function) {
        let scope = self.symbols.push_new_scope(&function.name.name);
        self.decor.put_scope(function.id, scope);

        let mut param_types = Vec::with_capacity(function.params.len());
        for param in &function.params {
            let ty = self.type_node(&param.ty);
            self.decor.put_type(param.id, ty);
            param_types.push(ty);
            if self.symbols.add_parameter(&param.name.name, ty).is_err() {
                self.errors.declared_ident(param.name.loc, &param.name.name);
            }
        }

        for decl in &function.decls {
            let ty = self.type_node(&decl.ty);
            for name in &decl.names {
                if self.symbols.add_local_var(&name.name, ty).is_err() {
                    self.errors.declared_ident(name.loc, &name.name);
                }
            }
        }

        self.symbols.pop_scope();

        let ret = match &function.ret {
            Some(ty) => self.type_node(ty),
            None => self.types.create_void_ty(),
        };

        // the node is decorated with the signature even when the name is a
        // duplicate, so the later passes can still walk the body
        let fn_type = self.types.create_function_ty(param_types, ret);
        self.decor.put_type(function.id, fn_type);

        if self
            .symbols
            .add_function(&function.name.name, fn_type)
            .is_err()
        {
            self.errors
                .declared_ident(function.name.loc, &function.name.name);
        }
    }

    fn type_node(&mut self, node: &TypeNode) -> TypeId {
        let ty = match node.kind {
            TypeNodeKind::Basic(basic) => self.basic(basic),
            TypeNodeKind::Array { size, elem } => {
                let elem = self.basic(elem);
                self.types.create_array_ty(size, elem)
            }
        };
        self.decor.put_type(node.id, ty);
        ty
    }

    fn basic(&mut self, basic: BasicType) -> TypeId {
        match basic {
            BasicType::Int => self.types.create_integer_ty(),
            BasicType::Bool => self.types.create_boolean_ty(),
            BasicType::Float => self.types.create_float_ty(),
            BasicType::Char => self.types.create_character_ty(),
        }
    }
}
