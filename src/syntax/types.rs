// SPDX-License-Identifier: GPL-2.0-only

//
// Value types and identifier properties
//

use std::fmt::{Display,Formatter};
use std::rc::Rc;

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Scalar {
    Integer,
    Boolean,
}

/// Parameter and return types of a subroutine
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct Signature {
    pub params: Vec<ValType>,
    // None for procedures
    pub ret: ValType,
}

#[derive(Clone,Debug,PartialEq,Eq)]
pub enum ValType {
    None,
    Integer,
    Boolean,
    Array(Scalar),
    Callable(Rc<Signature>),
}

impl ValType {
    pub fn scalar(&self) -> Option<Scalar> {
        match self {
            ValType::Integer => Some(Scalar::Integer),
            ValType::Boolean => Some(Scalar::Boolean),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ValType::Array(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, ValType::Callable(_))
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, ValType::Callable(sig) if sig.ret == ValType::None)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, ValType::Callable(sig) if sig.ret != ValType::None)
    }
}

impl From<Scalar> for ValType {
    fn from(scalar: Scalar) -> ValType {
        match scalar {
            Scalar::Integer => ValType::Integer,
            Scalar::Boolean => ValType::Boolean,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Integer => write!(fmt, "integer"),
            Scalar::Boolean => write!(fmt, "boolean"),
        }
    }
}

impl Display for ValType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValType::None => write!(fmt, "none"),
            ValType::Integer => write!(fmt, "integer"),
            ValType::Boolean => write!(fmt, "boolean"),
            ValType::Array(elem) => write!(fmt, "{} array", elem),
            ValType::Callable(sig) => {
                let params: Vec<String> = sig.params.iter().map(|p| p.to_string()).collect();
                if sig.ret == ValType::None {
                    write!(fmt, "procedure({})", params.join(", "))
                } else {
                    write!(fmt, "function({}) to {}", params.join(", "), sig.ret)
                }
            },
        }
    }
}

/// What the symbol table knows about a name
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct IdProp {
    pub ty: ValType,
    // Storage slot (starting at 1 per scope); 0 for subroutines
    pub offset: usize,
}

impl IdProp {
    pub fn new(ty: ValType, offset: usize) -> IdProp {
        IdProp {
            ty: ty,
            offset: offset,
        }
    }

    /// Formal parameter types for callables, empty otherwise
    pub fn params(&self) -> &[ValType] {
        match &self.ty {
            ValType::Callable(sig) => &sig.params,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callable_kinds() {
        let proc = ValType::Callable(Rc::new(Signature {
            params: vec![ValType::Integer, ValType::Array(Scalar::Boolean)],
            ret: ValType::None,
        }));
        let func = ValType::Callable(Rc::new(Signature {
            params: vec![],
            ret: ValType::Integer,
        }));
        assert!(proc.is_procedure() && !proc.is_function());
        assert!(func.is_function() && !func.is_procedure());
        assert_eq!(proc.to_string(), "procedure(integer, boolean array)");
        assert_eq!(func.to_string(), "function() to integer");
        assert_eq!(IdProp::new(proc, 0).params().len(), 2);
        assert!(IdProp::new(ValType::Integer, 1).params().is_empty());
    }
}
