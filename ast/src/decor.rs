//! Side-table annotations on parse-tree nodes.
//!
//! The binding pass writes scopes and declaration types, the type-check
//! pass writes expression types and l-value flags, code generation only
//! reads. Re-decorating a node overwrites the previous value; the passes
//! are deterministic, so a re-run writes back the same ids.

use super::NodeId;
use std::collections::HashMap;
use symtab::ScopeId;
use types::TypeId;

#[derive(Debug, Default)]
pub struct Decorations {
    scopes: HashMap<NodeId, ScopeId>,
    types: HashMap<NodeId, TypeId>,
    lvalues: HashMap<NodeId, bool>,
}

impl Decorations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.scopes.insert(node, scope);
    }

    pub fn put_type(&mut self, node: NodeId, ty: TypeId) {
        self.types.insert(node, ty);
    }

    pub fn put_is_lvalue(&mut self, node: NodeId, lvalue: bool) {
        self.lvalues.insert(node, lvalue);
    }

    pub fn scope(&self, node: NodeId) -> ScopeId {
        match self.scopes.get(&node) {
            Some(&scope) => scope,
            None => panic!("node {node:?} has no scope decoration"),
        }
    }

    pub fn ty(&self, node: NodeId) -> TypeId {
        match self.types.get(&node) {
            Some(&ty) => ty,
            None => panic!("node {node:?} has no type decoration"),
        }
    }

    pub fn is_lvalue(&self, node: NodeId) -> bool {
        match self.lvalues.get(&node) {
            Some(&lvalue) => lvalue,
            None => panic!("node {node:?} has no lvalue decoration"),
        }
    }

    pub fn try_ty(&self, node: NodeId) -> Option<TypeId> {
        self.types.get(&node).copied()
    }

    pub fn try_is_lvalue(&self, node: NodeId) -> Option<bool> {
        self.lvalues.get(&node).copied()
    }
}
