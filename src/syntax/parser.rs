// SPDX-License-Identifier: GPL-2.0-only

//
// Recursive descent translator: parses, resolves names, checks types and
// emits code in a single pass
//

use super::symtab::SymTab;
use super::types::{IdProp,Scalar,Signature,ValType};
use crate::error::{Error,ErrorKind,Pos,Result};
use crate::gen::{BOp,Cond,Gen};
use crate::lex::{Lexer,Tok,Token};

use std::rc::Rc;

pub struct Parser<'a, G: Gen> {
    // Lexer and lookahead token
    lex: Lexer<'a>,
    tmp: Token,
    symtab: SymTab,
    gen: &'a mut G,
    // Return type of the subroutine being translated
    ret: ValType,
    // Parser trace on stderr
    trace: bool,
    indent: usize,
}

macro_rules! want {
    ($self:expr, $pattern:pat, $expected:expr) => {
        match $self.tmp.tok {
            $pattern => { $self.next_token()?; },
            _ => return Err($self.expected($expected)),
        }
    }
}

macro_rules! maybe_want {
    ($self:expr, $pattern:pat) => {
        match $self.tmp.tok {
            $pattern => {
                $self.next_token()?;
                true
            },
            _ => false,
        }
    }
}

fn starts_expr(tok: &Tok) -> bool {
    matches!(tok, Tok::Minus | Tok::Ident(_) | Tok::Number(_) | Tok::LParen
        | Tok::Not | Tok::True | Tok::False)
}

fn incompatible(found: &ValType, expected: &ValType, context: String) -> ErrorKind {
    ErrorKind::IncompatibleTypes {
        expected: expected.to_string(),
        found: found.to_string(),
        context: context,
    }
}

impl<'a, G: Gen> Parser<'a, G> {
    pub fn new(data: &'a str, gen: &'a mut G) -> Result<Parser<'a, G>> {
        let mut lex = Lexer::new(data);
        let tmp = lex.next_token()?;
        Ok(Parser {
            lex: lex,
            tmp: tmp,
            symtab: SymTab::new(),
            gen: gen,
            ret: ValType::None,
            trace: false,
            indent: 0,
        })
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    fn next_token(&mut self) -> Result<Token> {
        let next = self.lex.next_token()?;
        Ok(std::mem::replace(&mut self.tmp, next))
    }

    fn expected(&self, what: &'static str) -> Error {
        Error::new(self.tmp.pos, ErrorKind::Expected {
            expected: what,
            found: self.tmp.tok.describe(),
        })
    }

    fn enter(&mut self, what: &str) {
        if self.trace {
            eprintln!("{:indent$}<{}> in line {}.", "", what, self.tmp.pos.line, indent = self.indent);
        }
        self.indent += 2;
    }

    fn exit(&mut self, what: &str) {
        self.indent -= 2;
        if self.trace {
            eprintln!("{:indent$}</{}> in line {}.", "", what, self.tmp.pos.line, indent = self.indent);
        }
    }

    fn want_ident(&mut self) -> Result<(Rc<str>, Pos)> {
        match self.tmp.tok {
            Tok::Ident(_) => {
                let token = self.next_token()?;
                if let Tok::Ident(s) = token.tok {
                    Ok((s, token.pos))
                } else {
                    unreachable!()
                }
            },
            _ => Err(self.expected("identifier")),
        }
    }

    fn find(&self, name: &Rc<str>, pos: Pos) -> Result<IdProp> {
        self.symtab.find_name(name)
            .map(|prop| prop.clone())
            .map_err(|kind| Error::new(pos, kind))
    }

    // Resolve a name that must denote a variable
    fn find_variable(&self, name: &Rc<str>, pos: Pos) -> Result<IdProp> {
        let prop = self.find(name, pos)?;
        if prop.ty.is_callable() {
            return Err(Error::new(pos, ErrorKind::NotAVariable(name.clone())));
        }
        Ok(prop)
    }

    fn element_type(prop: &IdProp, name: &Rc<str>, pos: Pos) -> Result<Scalar> {
        match prop.ty {
            ValType::Array(elem) => Ok(elem),
            _ => Err(Error::new(pos, ErrorKind::NotAnArray(name.clone()))),
        }
    }

    fn check_types(&self, found: &ValType, expected: &ValType, pos: Pos, context: String) -> Result<()> {
        if found != expected {
            return Err(Error::new(pos, incompatible(found, expected, context)));
        }
        Ok(())
    }

    // Check one operand of the operator "op"
    fn operand(&self, found: &ValType, expected: Scalar, op: &Token) -> Result<()> {
        if found.is_array() {
            return Err(Error::new(op.pos, ErrorKind::IllegalArrayOperation(op.tok.describe())));
        }
        self.check_types(found, &expected.into(), op.pos,
            format!("for operator {}", op.tok.describe()))
    }

    // "[" simple "]" with an integer index
    fn want_index(&mut self) -> Result<()> {
        want!(self, Tok::LSq, "'['");
        let pos = self.tmp.pos;
        let ty = self.want_simple()?;
        if ty.is_array() {
            return Err(Error::new(pos, ErrorKind::IllegalArrayOperation("array index".to_string())));
        }
        self.check_types(&ty, &ValType::Integer, pos, "for array index".to_string())?;
        want!(self, Tok::RSq, "']'");
        Ok(())
    }

    // "(" [ expr { "," expr } ] ")" checked against the parameters of "name"
    fn want_args(&mut self, name: &Rc<str>, prop: &IdProp) -> Result<()> {
        want!(self, Tok::LParen, "'('");
        let params = prop.params();
        let mut count = 0;
        if starts_expr(&self.tmp.tok) {
            loop {
                let pos = self.tmp.pos;
                let ty = self.want_expr()?;
                match params.get(count) {
                    Some(param) => self.check_types(&ty, param, pos,
                        format!("for argument {} of '{}'", count + 1, name))?,
                    None => return Err(Error::new(pos, ErrorKind::TooManyArguments(name.clone()))),
                }
                count += 1;
                if !maybe_want!(self, Tok::Comma) {
                    break;
                }
            }
        }
        let close = self.tmp.pos;
        want!(self, Tok::RParen, "')'");
        if count < params.len() {
            return Err(Error::new(close, ErrorKind::TooFewArguments(name.clone())));
        }
        Ok(())
    }

    //
    // Expressions
    //

    fn want_factor(&mut self) -> Result<ValType> {
        match self.tmp.tok {
            Tok::Ident(_) => {
                let (name, pos) = self.want_ident()?;
                let prop = self.find(&name, pos)?;
                match self.tmp.tok {
                    Tok::LSq => {
                        let elem = Self::element_type(&prop, &name, pos)?;
                        self.gen.load_local(prop.offset, &prop.ty);
                        self.want_index()?;
                        self.gen.load_element(elem);
                        Ok(elem.into())
                    },
                    Tok::LParen => {
                        let ret = match &prop.ty {
                            ValType::Callable(sig) if prop.ty.is_function() => sig.ret.clone(),
                            _ => return Err(Error::new(pos, ErrorKind::NotAFunction(name))),
                        };
                        self.want_args(&name, &prop)?;
                        self.gen.call(&name, &prop);
                        Ok(ret)
                    },
                    _ => {
                        if prop.ty.is_callable() {
                            return Err(Error::new(pos, ErrorKind::NotAVariable(name)));
                        }
                        self.gen.load_local(prop.offset, &prop.ty);
                        Ok(prop.ty)
                    },
                }
            },
            Tok::Number(val) => {
                self.next_token()?;
                self.gen.push_integer(val);
                Ok(ValType::Integer)
            },
            Tok::LParen => {
                self.next_token()?;
                let ty = self.want_expr()?;
                want!(self, Tok::RParen, "')'");
                Ok(ty)
            },
            Tok::Not => {
                let op = self.next_token()?;
                let ty = self.want_factor()?;
                self.operand(&ty, Scalar::Boolean, &op)?;
                self.gen.not();
                Ok(ValType::Boolean)
            },
            Tok::True => {
                self.next_token()?;
                self.gen.push_boolean(true);
                Ok(ValType::Boolean)
            },
            Tok::False => {
                self.next_token()?;
                self.gen.push_boolean(false);
                Ok(ValType::Boolean)
            },
            _ => Err(self.expected("factor")),
        }
    }

    fn want_term(&mut self) -> Result<ValType> {
        let mut ty = self.want_factor()?;
        loop {
            let (bop, scalar) = match self.tmp.tok {
                Tok::Mul => (BOp::Mul, Scalar::Integer),
                Tok::Div => (BOp::Div, Scalar::Integer),
                Tok::Rem => (BOp::Rem, Scalar::Integer),
                Tok::And => (BOp::And, Scalar::Boolean),
                _ => return Ok(ty),
            };
            let op = self.next_token()?;
            self.operand(&ty, scalar, &op)?;
            let ty2 = self.want_factor()?;
            self.operand(&ty2, scalar, &op)?;
            self.gen.binary(bop);
            ty = scalar.into();
        }
    }

    fn want_simple(&mut self) -> Result<ValType> {
        let minus = if let Tok::Minus = self.tmp.tok {
            Some(self.next_token()?)
        } else {
            None
        };

        let mut ty = self.want_term()?;
        if let Some(op) = minus {
            self.operand(&ty, Scalar::Integer, &op)?;
            self.gen.negate();
        }

        loop {
            let (bop, scalar) = match self.tmp.tok {
                Tok::Plus => (BOp::Add, Scalar::Integer),
                Tok::Minus => (BOp::Sub, Scalar::Integer),
                Tok::Or => (BOp::Or, Scalar::Boolean),
                _ => return Ok(ty),
            };
            let op = self.next_token()?;
            self.operand(&ty, scalar, &op)?;
            let ty2 = self.want_term()?;
            self.operand(&ty2, scalar, &op)?;
            self.gen.binary(bop);
            ty = scalar.into();
        }
    }

    fn want_expr(&mut self) -> Result<ValType> {
        let ty = self.want_simple()?;
        let cond = match self.tmp.tok {
            Tok::Eq => Cond::Eq,
            Tok::Ne => Cond::Ne,
            Tok::Lt => Cond::Lt,
            Tok::Le => Cond::Le,
            Tok::Gt => Cond::Gt,
            Tok::Ge => Cond::Ge,
            _ => return Ok(ty),
        };
        let op = self.next_token()?;
        match cond {
            Cond::Eq | Cond::Ne => {
                if ty.is_array() {
                    return Err(Error::new(op.pos, ErrorKind::IllegalArrayOperation(op.tok.describe())));
                }
                let ty2 = self.want_simple()?;
                if ty2.is_array() {
                    return Err(Error::new(op.pos, ErrorKind::IllegalArrayOperation(op.tok.describe())));
                }
                self.check_types(&ty2, &ty, op.pos, format!("for operator {}", op.tok.describe()))?;
            },
            _ => {
                self.operand(&ty, Scalar::Integer, &op)?;
                let ty2 = self.want_simple()?;
                self.operand(&ty2, Scalar::Integer, &op)?;
            },
        }
        self.gen.compare(cond);
        Ok(ValType::Boolean)
    }

    // Expression that must be boolean, as used by "if" and "while"
    fn want_guard(&mut self, what: &str) -> Result<()> {
        let pos = self.tmp.pos;
        let ty = self.want_expr()?;
        self.check_types(&ty, &ValType::Boolean, pos, format!("for '{}' guard", what))
    }

    //
    // Statements
    //

    fn want_assign(&mut self) -> Result<()> {
        let (name, pos) = self.want_ident()?;
        let prop = self.find_variable(&name, pos)?;

        let elem = if let Tok::LSq = self.tmp.tok {
            let elem = Self::element_type(&prop, &name, pos)?;
            self.gen.load_local(prop.offset, &prop.ty);
            self.want_index()?;
            Some(elem)
        } else {
            None
        };

        want!(self, Tok::Gets, "':='");

        if let Tok::Array = self.tmp.tok {
            let alloc = self.next_token()?;
            if elem.is_some() {
                return Err(Error::new(alloc.pos,
                    ErrorKind::IllegalArrayOperation(format!("allocation into element of '{}'", name))));
            }
            let elem = Self::element_type(&prop, &name, pos)?;
            let size = self.tmp.pos;
            let ty = self.want_simple()?;
            self.check_types(&ty, &ValType::Integer, size, "for array size".to_string())?;
            self.gen.new_array(elem);
            self.gen.store_local(prop.offset, &prop.ty);
        } else if starts_expr(&self.tmp.tok) {
            let epos = self.tmp.pos;
            let ty = self.want_expr()?;
            match elem {
                Some(elem) => {
                    self.check_types(&ty, &elem.into(), epos,
                        format!("for assignment to element of '{}'", name))?;
                    self.gen.store_element(elem);
                },
                None => {
                    self.check_types(&ty, &prop.ty, epos, format!("for assignment to '{}'", name))?;
                    self.gen.store_local(prop.offset, &prop.ty);
                },
            }
        } else {
            return Err(self.expected("array allocation or expression"));
        }
        Ok(())
    }

    fn want_call(&mut self) -> Result<()> {
        want!(self, Tok::Call, "'call'");
        let (name, pos) = self.want_ident()?;
        let prop = self.find(&name, pos)?;
        if !prop.ty.is_procedure() {
            return Err(Error::new(pos, ErrorKind::NotAProcedure(name)));
        }
        self.want_args(&name, &prop)?;
        self.gen.call(&name, &prop);
        Ok(())
    }

    fn want_if(&mut self) -> Result<()> {
        want!(self, Tok::If, "'if'");
        let end = self.gen.new_label();

        self.want_guard("if")?;
        let mut next = self.gen.new_label();
        self.gen.jump_if_false(next);
        want!(self, Tok::Then, "'then'");
        self.want_statements()?;

        while maybe_want!(self, Tok::Elsif) {
            self.gen.jump(end);
            self.gen.label(next);
            self.want_guard("elsif")?;
            next = self.gen.new_label();
            self.gen.jump_if_false(next);
            want!(self, Tok::Then, "'then'");
            self.want_statements()?;
        }

        if maybe_want!(self, Tok::Else) {
            self.gen.jump(end);
            self.gen.label(next);
            self.want_statements()?;
        } else {
            self.gen.label(next);
        }

        want!(self, Tok::End, "'end'");
        self.gen.label(end);
        Ok(())
    }

    fn want_input(&mut self) -> Result<()> {
        want!(self, Tok::Get, "'get'");
        let (name, pos) = self.want_ident()?;
        let prop = self.find_variable(&name, pos)?;

        if let Tok::LSq = self.tmp.tok {
            let elem = Self::element_type(&prop, &name, pos)?;
            self.gen.load_local(prop.offset, &prop.ty);
            self.want_index()?;
            self.gen.read_value(elem);
            self.gen.store_element(elem);
        } else {
            let scalar = prop.ty.scalar()
                .ok_or_else(|| Error::new(pos, ErrorKind::ScalarExpected(name.clone())))?;
            self.gen.read_value(scalar);
            self.gen.store_local(prop.offset, &prop.ty);
        }
        Ok(())
    }

    fn want_leave(&mut self) -> Result<()> {
        let pos = self.tmp.pos;
        want!(self, Tok::Leave, "'leave'");

        if starts_expr(&self.tmp.tok) {
            if self.ret == ValType::None {
                return Err(Error::new(pos, ErrorKind::ReturnNotAllowed));
            }
            let epos = self.tmp.pos;
            let ty = self.want_expr()?;
            let ret = self.ret.clone();
            self.check_types(&ty, &ret, epos, "for 'leave'".to_string())?;
            self.gen.ret(Some(&ret));
        } else {
            if self.ret != ValType::None {
                return Err(Error::new(pos, ErrorKind::MissingReturn));
            }
            self.gen.ret(None);
        }
        Ok(())
    }

    fn want_output(&mut self) -> Result<()> {
        want!(self, Tok::Put, "'put'");
        loop {
            if let Tok::Str(s) = &self.tmp.tok {
                let s = s.clone();
                self.next_token()?;
                self.gen.print_string(&s);
            } else if starts_expr(&self.tmp.tok) {
                let pos = self.tmp.pos;
                let ty = self.want_expr()?;
                let scalar = ty.scalar()
                    .ok_or_else(|| Error::new(pos, ErrorKind::IllegalArrayOperation("'put'".to_string())))?;
                self.gen.print_value(scalar);
            } else {
                return Err(self.expected("expression or string"));
            }
            if !maybe_want!(self, Tok::Concat) {
                return Ok(());
            }
        }
    }

    fn want_while(&mut self) -> Result<()> {
        want!(self, Tok::While, "'while'");
        let top = self.gen.new_label();
        let end = self.gen.new_label();

        self.gen.label(top);
        self.want_guard("while")?;
        self.gen.jump_if_false(end);
        want!(self, Tok::Do, "'do'");
        self.want_statements()?;
        want!(self, Tok::End, "'end'");
        self.gen.jump(top);
        self.gen.label(end);
        Ok(())
    }

    fn want_statement(&mut self) -> Result<()> {
        match self.tmp.tok {
            Tok::Ident(_) => self.want_assign(),
            Tok::Call => self.want_call(),
            Tok::If => self.want_if(),
            Tok::Get => self.want_input(),
            Tok::Leave => self.want_leave(),
            Tok::Put => self.want_output(),
            Tok::While => self.want_while(),
            _ => Err(self.expected("statement")),
        }
    }

    fn want_statements(&mut self) -> Result<()> {
        if maybe_want!(self, Tok::Relax) {
            return Ok(());
        }
        self.want_statement()?;
        while maybe_want!(self, Tok::Semicolon) {
            self.want_statement()?;
        }
        Ok(())
    }

    //
    // Declarations
    //

    fn want_type(&mut self) -> Result<ValType> {
        let scalar = match self.tmp.tok {
            Tok::Boolean => Scalar::Boolean,
            Tok::Integer => Scalar::Integer,
            _ => return Err(self.expected("type")),
        };
        self.next_token()?;
        if maybe_want!(self, Tok::Array) {
            Ok(ValType::Array(scalar))
        } else {
            Ok(scalar.into())
        }
    }

    fn want_vardef(&mut self) -> Result<()> {
        let ty = self.want_type()?;
        loop {
            let (name, pos) = self.want_ident()?;
            let offset = self.symtab.insert_name(name, ty.clone())
                .map_err(|kind| Error::new(pos, kind))?;
            match ty {
                ValType::Array(elem) => self.gen.declare_array(offset, elem),
                ValType::Integer => self.gen.declare_scalar(offset, Scalar::Integer),
                ValType::Boolean => self.gen.declare_scalar(offset, Scalar::Boolean),
                _ => unreachable!(),
            }
            if !maybe_want!(self, Tok::Comma) {
                break;
            }
        }
        want!(self, Tok::Semicolon, "';'");
        Ok(())
    }

    fn want_body(&mut self) -> Result<()> {
        self.enter("body");
        want!(self, Tok::Begin, "'begin'");
        while let Tok::Boolean | Tok::Integer = self.tmp.tok {
            self.want_vardef()?;
        }
        self.want_statements()?;
        want!(self, Tok::End, "'end'");
        self.exit("body");
        Ok(())
    }

    fn want_funcdef(&mut self) -> Result<()> {
        self.enter("funcdef");
        want!(self, Tok::Function, "'function'");
        let (name, pos) = self.want_ident()?;

        // Read parameters
        want!(self, Tok::LParen, "'('");
        let mut params = Vec::new();
        if let Tok::Boolean | Tok::Integer = self.tmp.tok {
            loop {
                let ty = self.want_type()?;
                let (param, ppos) = self.want_ident()?;
                params.push((param, ppos, ty));
                if !maybe_want!(self, Tok::Comma) {
                    break;
                }
            }
        }
        want!(self, Tok::RParen, "')'");

        // Read return type (if any)
        let ret = if maybe_want!(self, Tok::To) {
            self.want_type()?
        } else {
            ValType::None
        };

        let types: Vec<ValType> = params.iter().map(|(_, _, ty)| ty.clone()).collect();
        let sig = Signature {
            params: types.clone(),
            ret: ret.clone(),
        };
        self.symtab.open_subroutine(name.clone(), ValType::Callable(Rc::new(sig)))
            .map_err(|kind| Error::new(pos, kind))?;
        for (param, ppos, ty) in params {
            self.symtab.insert_name(param, ty).map_err(|kind| Error::new(ppos, kind))?;
        }

        self.gen.begin_subroutine(&name, &types, &ret);
        self.ret = ret;
        self.want_body()?;
        if self.ret == ValType::None {
            self.gen.ret(None);
        }
        self.gen.end_subroutine(self.symtab.variables_width());

        if self.trace {
            eprint!("{}", self.symtab.dump());
        }
        self.symtab.close_subroutine();
        self.exit("funcdef");
        Ok(())
    }

    /// Translate a whole program
    pub fn want_source(&mut self) -> Result<()> {
        self.enter("source");
        want!(self, Tok::Source, "'source'");
        let (name, _) = self.want_ident()?;
        self.gen.begin_program(&name);

        while let Tok::Function = self.tmp.tok {
            self.want_funcdef()?;
        }

        // The main body lives in the global scope
        self.gen.begin_main();
        self.ret = ValType::None;
        self.want_body()?;
        self.gen.ret(None);
        self.gen.end_subroutine(self.symtab.variables_width());

        want!(self, Tok::Eof, "end-of-file");
        self.gen.end_program();
        self.exit("source");
        Ok(())
    }
}
