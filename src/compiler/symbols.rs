//! Two-level symbol tables
//!
//! The function directory is the global table. Each function symbol owns a
//! child table holding its parameters and locals. Name resolution only ever
//! looks at the current function and then the globals.

use super::ir::{Address, ValueType};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Declared kind of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Variable of the given type
    Var(ValueType),
    /// Function parameter of the given type
    Param(ValueType),
    /// The program itself
    GlobalTable,
    /// A function with its own local table
    LocalTable,
}

impl SymbolKind {
    /// Value type for variables and parameters
    pub fn value_type(self) -> Option<ValueType> {
        match self {
            SymbolKind::Var(ty) | SymbolKind::Param(ty) => Some(ty),
            _ => None,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Var(ty) => write!(f, "var.{}", ty),
            SymbolKind::Param(ty) => write!(f, "param.{}", ty),
            SymbolKind::GlobalTable => write!(f, "table.global"),
            SymbolKind::LocalTable => write!(f, "table.local"),
        }
    }
}

/// A named entry of a symbol table
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Identifier
    pub name: String,
    /// Declared kind
    pub kind: SymbolKind,
    /// Assigned address (function id for functions)
    pub address: Option<Address>,
    /// Nested table (functions)
    pub table: Option<SymbolTable>,
    /// Index of the first body quadruple (functions)
    pub start: Option<usize>,
}

impl Symbol {
    /// Variable or parameter symbol
    pub fn new(name: impl Into<String>, kind: SymbolKind, address: Address) -> Self {
        Self {
            name: name.into(),
            kind,
            address: Some(address),
            table: None,
            start: None,
        }
    }

    /// Function symbol with an empty local table
    pub fn function(name: impl Into<String>, id: Address) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::LocalTable,
            address: Some(id),
            table: Some(SymbolTable::new()),
            start: None,
        }
    }
}

/// Name-keyed symbol store that remembers declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol; fails if the name is taken
    pub fn declare(&mut self, symbol: Symbol) -> Result<()> {
        if self.index.contains_key(&symbol.name) {
            return Err(Error::AlreadyDeclared { name: symbol.name });
        }
        self.index.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }

    /// Find a symbol by name
    pub fn lookup(&self, name: &str) -> Result<&Symbol> {
        self.index
            .get(name)
            .map(|i| &self.symbols[*i])
            .ok_or_else(|| undeclared(name))
    }

    /// Find a symbol by name for modification
    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Symbol> {
        match self.index.get(name) {
            Some(i) => Ok(&mut self.symbols[*i]),
            None => Err(undeclared(name)),
        }
    }

    /// Replace an existing symbol of the same name
    pub fn update(&mut self, symbol: Symbol) -> Result<()> {
        let slot = self.lookup_mut(&symbol.name)?;
        *slot = symbol;
        Ok(())
    }

    /// Remove a symbol and return it
    pub fn remove(&mut self, name: &str) -> Result<Symbol> {
        let position = self.index.remove(name).ok_or_else(|| undeclared(name))?;
        let symbol = self.symbols.remove(position);
        for i in self.index.values_mut() {
            if *i > position {
                *i -= 1;
            }
        }
        Ok(symbol)
    }

    /// True when `name` is declared here
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Symbols in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn undeclared(name: &str) -> Error {
    Error::Undeclared {
        name: name.to_string(),
    }
}

/// One level of the live scope stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRef {
    /// Program-level names
    Global,
    /// Locals and parameters of the named function
    Function(String),
}

/// The global symbol table: global variables and functions
#[derive(Debug, Clone, Default)]
pub struct FunctionDirectory {
    /// Program symbol (`table.global`)
    pub program: Option<Symbol>,
    globals: SymbolTable,
}

impl FunctionDirectory {
    /// Directory for the named program
    pub fn new(program: &str) -> Self {
        Self {
            program: Some(Symbol {
                name: program.to_string(),
                kind: SymbolKind::GlobalTable,
                address: None,
                table: None,
                start: None,
            }),
            globals: SymbolTable::new(),
        }
    }

    /// Global names in declaration order
    pub fn globals(&self) -> &SymbolTable {
        &self.globals
    }

    /// Table that owns declarations made in `scope`
    pub fn table_mut(&mut self, scope: &ScopeRef) -> Result<&mut SymbolTable> {
        match scope {
            ScopeRef::Global => Ok(&mut self.globals),
            ScopeRef::Function(name) => self
                .function_mut(name)?
                .table
                .as_mut()
                .ok_or_else(|| Error::compiler(format!("function {} has no local table", name))),
        }
    }

    /// Resolve a name through the scope stack, innermost first
    pub fn resolve(&self, scopes: &[ScopeRef], name: &str) -> Result<&Symbol> {
        for scope in scopes.iter().rev() {
            let table = match scope {
                ScopeRef::Global => Some(&self.globals),
                ScopeRef::Function(function) => {
                    self.function(function).ok().and_then(|f| f.table.as_ref())
                }
            };
            if let Some(symbol) = table.and_then(|t| t.lookup(name).ok()) {
                return Ok(symbol);
            }
        }
        Err(undeclared(name))
    }

    /// Function symbol by name
    pub fn function(&self, name: &str) -> Result<&Symbol> {
        match self.globals.lookup(name) {
            Ok(symbol) if symbol.kind == SymbolKind::LocalTable => Ok(symbol),
            _ => Err(undeclared(name)),
        }
    }

    /// Function symbol by name, for modification
    pub fn function_mut(&mut self, name: &str) -> Result<&mut Symbol> {
        match self.globals.lookup_mut(name) {
            Ok(symbol) if symbol.kind == SymbolKind::LocalTable => Ok(symbol),
            _ => Err(undeclared(name)),
        }
    }

    /// Declared parameter types of a function, in positional order
    pub fn parameters(&self, name: &str) -> Result<Vec<ValueType>> {
        let table = self.function(name)?.table.as_ref();
        Ok(table
            .into_iter()
            .flat_map(|t| t.iter())
            .filter_map(|s| match s.kind {
                SymbolKind::Param(ty) => Some(ty),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_then_lookup() {
        let mut table = SymbolTable::new();
        let symbol = Symbol::new("x", SymbolKind::Var(ValueType::Int), 2000);
        table.declare(symbol.clone()).unwrap();
        assert_eq!(table.lookup("x").unwrap(), &symbol);
    }

    #[test]
    fn test_duplicate_and_missing_names() {
        let mut table = SymbolTable::new();
        table
            .declare(Symbol::new("x", SymbolKind::Var(ValueType::Int), 2000))
            .unwrap();
        assert!(matches!(
            table.declare(Symbol::new("x", SymbolKind::Var(ValueType::Float), 3000)),
            Err(Error::AlreadyDeclared { .. })
        ));
        assert!(matches!(table.lookup("y"), Err(Error::Undeclared { .. })));
        assert!(matches!(
            table.update(Symbol::new("y", SymbolKind::Var(ValueType::Int), 2001)),
            Err(Error::Undeclared { .. })
        ));
        assert!(matches!(table.remove("y"), Err(Error::Undeclared { .. })));
    }

    #[test]
    fn test_remove_keeps_order_of_the_rest() {
        let mut table = SymbolTable::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            table
                .declare(Symbol::new(*name, SymbolKind::Var(ValueType::Int), 2000 + i as i64))
                .unwrap();
        }
        table.remove("a").unwrap();
        let names: Vec<&str> = table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(table.lookup("c").unwrap().address, Some(2002));
    }

    #[test]
    fn test_resolution_is_two_level() {
        let mut dir = FunctionDirectory::new("demo");
        let global = ScopeRef::Global;
        dir.table_mut(&global)
            .unwrap()
            .declare(Symbol::new("x", SymbolKind::Var(ValueType::Int), 2000))
            .unwrap();
        for name in ["f", "g"] {
            dir.table_mut(&global)
                .unwrap()
                .declare(Symbol::function(name, 1000))
                .unwrap();
        }
        let f = ScopeRef::Function("f".into());
        dir.table_mut(&f)
            .unwrap()
            .declare(Symbol::new("x", SymbolKind::Param(ValueType::Float), 11000))
            .unwrap();

        let in_f = [global.clone(), f];
        assert_eq!(dir.resolve(&in_f, "x").unwrap().address, Some(11000));

        let in_g = [global.clone(), ScopeRef::Function("g".into())];
        assert_eq!(dir.resolve(&in_g, "x").unwrap().address, Some(2000));

        assert!(matches!(
            dir.resolve(&[global], "nope"),
            Err(Error::Undeclared { .. })
        ));
        assert_eq!(dir.parameters("f").unwrap(), vec![ValueType::Float]);
    }

    #[test]
    fn test_variable_is_not_a_function() {
        let mut dir = FunctionDirectory::new("demo");
        dir.table_mut(&ScopeRef::Global)
            .unwrap()
            .declare(Symbol::new("x", SymbolKind::Var(ValueType::Int), 2000))
            .unwrap();
        assert!(matches!(dir.function("x"), Err(Error::Undeclared { .. })));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SymbolKind::Var(ValueType::Int).to_string(), "var.int");
        assert_eq!(SymbolKind::Param(ValueType::Float).to_string(), "param.float");
        assert_eq!(SymbolKind::LocalTable.to_string(), "table.local");
    }
}
