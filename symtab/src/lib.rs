use thiserror::Error;
use types::{TypeId, TypesMgr};

/// Name of the bottom scope holding the program's functions.
pub const GLOBAL_SCOPE_NAME: &str = "$global";

/// Handle to a scope. Scopes are never destroyed; a popped scope can be
/// pushed again by a later pass re-entering the same function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(u32);

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    LocalVar,
    Parameter,
    Function,
}

#[derive(Debug)]
pub struct Entry {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeId,
}

#[derive(Debug)]
struct Scope {
    name: String,
    entries: Vec<Entry>,
}

impl Scope {
    fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Error)]
#[error("'{0}' is already declared in the current scope")]
pub struct Redeclared(pub String);

/// Stack of lexical scopes. Identifiers resolve to the nearest enclosing
/// scope that declares them.
#[derive(Debug, Default)]
pub struct SymTable {
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
}

impl SymTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_new_scope(&mut self, name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            name: name.to_owned(),
            entries: Vec::new(),
        });
        self.stack.push(id);
        id
    }

    pub fn push_this_scope(&mut self, id: ScopeId) {
        assert!((id.0 as usize) < self.scopes.len(), "unknown scope {id:?}");
        self.stack.push(id);
    }

    pub fn pop_scope(&mut self) {
        self.stack.pop().expect("popped an empty scope stack");
    }

    pub fn current_scope_name(&self) -> &str {
        &self.current().name
    }

    fn current(&self) -> &Scope {
        let &id = self.stack.last().expect("no scope pushed");
        &self.scopes[id.0 as usize]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let &id = self.stack.last().expect("no scope pushed");
        &mut self.scopes[id.0 as usize]
    }

    fn add(&mut self, name: &str, kind: SymbolKind, ty: TypeId) -> Result<(), Redeclared> {
        let scope = self.current_mut();
        if scope.find(name).is_some() {
            return Err(Redeclared(name.to_owned()));
        }
        scope.entries.push(Entry {
            name: name.to_owned(),
            kind,
            ty,
        });
        Ok(())
    }

    pub fn add_local_var(&mut self, name: &str, ty: TypeId) -> Result<(), Redeclared> {
        self.add(name, SymbolKind::LocalVar, ty)
    }

    pub fn add_parameter(&mut self, name: &str, ty: TypeId) -> Result<(), Redeclared> {
        self.add(name, SymbolKind::Parameter, ty)
    }

    pub fn add_function(&mut self, name: &str, ty: TypeId) -> Result<(), Redeclared> {
        self.add(name, SymbolKind::Function, ty)
    }

    pub fn find_in_current_scope(&self, name: &str) -> bool {
        self.current().find(name).is_some()
    }

    /// Nearest enclosing scope declaring `name`, or `None` if unresolved.
    pub fn find_in_stack(&self, name: &str) -> Option<ScopeId> {
        self.stack
            .iter()
            .rev()
            .find(|&&id| self.scopes[id.0 as usize].find(name).is_some())
            .copied()
    }

    fn resolve(&self, name: &str) -> Option<&Entry> {
        let id = self.find_in_stack(name)?;
        self.scopes[id.0 as usize].find(name)
    }

    /// Type of `name` in the nearest scope declaring it. The caller must
    /// have resolved the name first.
    pub fn get_type(&self, name: &str) -> TypeId {
        match self.resolve(name) {
            Some(entry) => entry.ty,
            None => panic!("get_type on unresolved identifier '{name}'"),
        }
    }

    pub fn is_function_class(&self, name: &str) -> bool {
        self.resolve(name)
            .is_some_and(|e| e.kind == SymbolKind::Function)
    }

    pub fn is_parameter_class(&self, name: &str) -> bool {
        self.resolve(name)
            .is_some_and(|e| e.kind == SymbolKind::Parameter)
    }

    /// True unless the bottom scope declares a function `main` of type
    /// `() -> void`.
    pub fn no_main_properly_declared(&self, types: &TypesMgr) -> bool {
        let Some(&bottom) = self.stack.first() else {
            return true;
        };
        let Some(entry) = self.scopes[bottom.0 as usize].find("main") else {
            return true;
        };
        entry.kind != SymbolKind::Function
            || !types.is_function_ty(entry.ty)
            || types.get_num_of_parameters(entry.ty) != 0
            || !types.is_void_ty(types.get_func_return_type(entry.ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lookup_finds_nearest() {
        let mut t = TypesMgr::new();
        let mut s = SymTable::new();
        let global = s.push_new_scope(GLOBAL_SCOPE_NAME);
        s.add_function("f", t.create_function_ty(vec![], t.create_void_ty()))
            .unwrap();
        let inner = s.push_new_scope("f");
        s.add_local_var("x", t.create_integer_ty()).unwrap();

        assert_eq!(s.find_in_stack("x"), Some(inner));
        assert_eq!(s.find_in_stack("f"), Some(global));
        assert_eq!(s.find_in_stack("y"), None);
        assert_eq!(s.get_type("x"), t.create_integer_ty());
        assert!(s.is_function_class("f"));
        assert!(!s.is_function_class("x"));

        s.pop_scope();
        assert_eq!(s.find_in_stack("x"), None);

        // a pass re-entering the function sees its locals again
        s.push_this_scope(inner);
        assert_eq!(s.find_in_stack("x"), Some(inner));
    }

    #[test]
    fn redeclaration_in_same_scope() {
        let t = TypesMgr::new();
        let mut s = SymTable::new();
        s.push_new_scope("f");
        s.add_parameter("a", t.create_integer_ty()).unwrap();
        assert!(s.add_local_var("a", t.create_float_ty()).is_err());
        assert!(s.add_parameter("a", t.create_integer_ty()).is_err());
        // shadowing in a new scope is fine
        s.push_new_scope("g");
        s.add_local_var("a", t.create_float_ty()).unwrap();
    }

    #[test]
    fn main_detection() {
        let mut t = TypesMgr::new();
        let mut s = SymTable::new();
        s.push_new_scope(GLOBAL_SCOPE_NAME);
        assert!(s.no_main_properly_declared(&t));

        let void_fn = t.create_function_ty(vec![], t.create_void_ty());
        s.add_function("main", void_fn).unwrap();
        assert!(!s.no_main_properly_declared(&t));
    }

    #[test]
    fn main_with_parameters_is_not_main() {
        let mut t = TypesMgr::new();
        let mut s = SymTable::new();
        s.push_new_scope(GLOBAL_SCOPE_NAME);
        let bad = t.create_function_ty(vec![t.create_integer_ty()], t.create_void_ty());
        s.add_function("main", bad).unwrap();
        assert!(s.no_main_properly_declared(&t));
    }
}
