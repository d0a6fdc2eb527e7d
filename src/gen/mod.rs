// SPDX-License-Identifier: GPL-2.0-only

//
// Code generation interface
//

pub mod jasmin;
pub mod record;

use crate::syntax::{IdProp,Scalar,ValType};

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum BOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

//
// Events issued by the translator, in source order
//

pub trait Gen {
    type Label: Clone + Copy;

    // Start the program unit called "name"
    fn begin_program(&mut self, name: &str);
    fn begin_subroutine(&mut self, name: &str, params: &[ValType], ret: &ValType);
    // Start the main body, which takes no parameters and returns nothing
    fn begin_main(&mut self);
    // Close the current subroutine, which uses "width" local variable slots
    fn end_subroutine(&mut self, width: usize);
    fn end_program(&mut self);

    // Initialise the local variable at "offset"
    fn declare_scalar(&mut self, offset: usize, ty: Scalar);
    fn declare_array(&mut self, offset: usize, elem: Scalar);
    // Allocate an array; the element count is on the stack
    fn new_array(&mut self, elem: Scalar);

    fn load_local(&mut self, offset: usize, ty: &ValType);
    fn store_local(&mut self, offset: usize, ty: &ValType);
    // Array reference and index are on the stack (and the value for stores)
    fn load_element(&mut self, elem: Scalar);
    fn store_element(&mut self, elem: Scalar);

    fn push_integer(&mut self, val: i32);
    fn push_boolean(&mut self, val: bool);

    fn binary(&mut self, op: BOp);
    // Compare two integers, leaving a boolean
    fn compare(&mut self, cond: Cond);
    fn negate(&mut self);
    fn not(&mut self);

    fn print_string(&mut self, text: &str);
    fn print_value(&mut self, ty: Scalar);
    fn read_value(&mut self, ty: Scalar);

    // Arguments are on the stack in declaration order
    fn call(&mut self, name: &str, prop: &IdProp);
    // Return from the current subroutine, with the value on the stack if typed
    fn ret(&mut self, ty: Option<&ValType>);

    fn new_label(&mut self) -> Self::Label;
    fn label(&mut self, label: Self::Label);
    fn jump(&mut self, label: Self::Label);
    // Pop a boolean and jump if it is false
    fn jump_if_false(&mut self, label: Self::Label);
}
