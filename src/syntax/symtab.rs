// SPDX-License-Identifier: GPL-2.0-only

//
// Symbol table
//

use super::types::{IdProp,ValType};
use crate::error::ErrorKind;
use crate::hashtab::HashTab;
use std::rc::Rc;

const MAX_LOAD_FACTOR: f32 = 0.75;

// Subroutines cannot nest, so there is never more than an outer and an inner scope
const MAX_DEPTH: usize = 2;

// 5-bit cyclic shift of the running sum
fn shift_hash(key: &Rc<str>, size: usize) -> usize {
    let h = key.bytes().fold(0u32, |h, b| h.rotate_left(5).wrapping_add(b as u32));
    h as usize % size
}

fn key_eq(a: &Rc<str>, b: &Rc<str>) -> bool {
    a == b
}

struct Scope {
    names: HashTab<Rc<str>, IdProp>,
    // Next storage slot
    offset: usize,
}

impl Scope {
    fn new() -> Scope {
        Scope {
            names: HashTab::new(MAX_LOAD_FACTOR, shift_hash, key_eq),
            offset: 1,
        }
    }
}

//
// Global scope plus the scope of the subroutine being compiled
//

pub struct SymTab {
    scopes: Vec<Scope>,
}

impl SymTab {
    pub fn new() -> SymTab {
        SymTab {
            scopes: vec![Scope::new()],
        }
    }

    fn active(&mut self) -> &mut Scope {
        // There is always at least the global scope
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Number of open scopes (1 at global level, 2 inside a subroutine)
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare a subroutine in the active scope and make its body the active scope
    pub fn open_subroutine(&mut self, name: Rc<str>, ty: ValType) -> Result<(), ErrorKind> {
        assert!(self.depth() < MAX_DEPTH, "nested subroutine '{}'", name);
        let scope = self.active();
        if scope.names.search(&name).is_some() {
            return Err(ErrorKind::MultipleDefinition(name));
        }
        scope.names.insert(name, IdProp::new(ty, 0));
        self.scopes.push(Scope::new());
        Ok(())
    }

    /// Declare a variable or parameter in the active scope, returning its offset
    pub fn insert_name(&mut self, name: Rc<str>, ty: ValType) -> Result<usize, ErrorKind> {
        let scope = self.active();
        if scope.names.search(&name).is_some() {
            return Err(ErrorKind::MultipleDefinition(name));
        }
        let offset = scope.offset;
        scope.offset += 1;
        scope.names.insert(name, IdProp::new(ty, offset));
        Ok(offset)
    }

    /// Resolve a name, seeing only subroutines in the outer scope
    pub fn find_name(&self, name: &Rc<str>) -> Result<&IdProp, ErrorKind> {
        let mut scopes = self.scopes.iter().rev();
        if let Some(prop) = scopes.next().and_then(|scope| scope.names.search(name)) {
            return Ok(prop);
        }
        scopes
            .filter_map(|scope| scope.names.search(name))
            .find(|prop| prop.ty.is_callable())
            .ok_or_else(|| ErrorKind::UnknownIdentifier(name.clone()))
    }

    /// Release the subroutine scope and reactivate the outer one
    pub fn close_subroutine(&mut self) {
        assert!(self.depth() == MAX_DEPTH, "no subroutine to close");
        if let Some(scope) = self.scopes.pop() {
            scope.names.free(drop, drop);
        }
    }

    /// Number of storage slots used so far in the active scope
    pub fn variables_width(&self) -> usize {
        self.scopes.last().map_or(0, |scope| scope.offset - 1)
    }

    /// Bucket listing of the active scope
    pub fn dump(&self) -> String {
        self.scopes.last().map_or_else(String::new, |scope| {
            scope.names.dump(|name, prop| format!("{}@{}[{}]", name, prop.offset, prop.ty))
        })
    }
}
