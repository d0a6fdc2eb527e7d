// SPDX-License-Identifier: GPL-2.0-only

//
// Backend that only records the emitted events
//

use super::{BOp,Cond,Gen};
use crate::syntax::{IdProp,Scalar,ValType};

#[derive(Clone,Debug,PartialEq,Eq)]
pub enum Event {
    BeginProgram(String),
    BeginSubroutine(String, Vec<ValType>, ValType),
    BeginMain,
    EndSubroutine(usize),
    EndProgram,
    DeclareScalar(usize, Scalar),
    DeclareArray(usize, Scalar),
    NewArray(Scalar),
    LoadLocal(usize),
    StoreLocal(usize),
    LoadElement(Scalar),
    StoreElement(Scalar),
    PushInteger(i32),
    PushBoolean(bool),
    Binary(BOp),
    Compare(Cond),
    Negate,
    Not,
    PrintString(String),
    PrintValue(Scalar),
    ReadValue(Scalar),
    Call(String, usize),
    Return(Option<ValType>),
    Label(usize),
    Jump(usize),
    JumpIfFalse(usize),
}

#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    labels: usize,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }
}

impl Gen for Recorder {
    type Label = usize;

    fn begin_program(&mut self, name: &str) {
        self.events.push(Event::BeginProgram(name.to_string()));
    }

    fn begin_subroutine(&mut self, name: &str, params: &[ValType], ret: &ValType) {
        self.events.push(Event::BeginSubroutine(name.to_string(), params.to_vec(), ret.clone()));
    }

    fn begin_main(&mut self) {
        self.events.push(Event::BeginMain);
    }

    fn end_subroutine(&mut self, width: usize) {
        self.events.push(Event::EndSubroutine(width));
    }

    fn end_program(&mut self) {
        self.events.push(Event::EndProgram);
    }

    fn declare_scalar(&mut self, offset: usize, ty: Scalar) {
        self.events.push(Event::DeclareScalar(offset, ty));
    }

    fn declare_array(&mut self, offset: usize, elem: Scalar) {
        self.events.push(Event::DeclareArray(offset, elem));
    }

    fn new_array(&mut self, elem: Scalar) {
        self.events.push(Event::NewArray(elem));
    }

    fn load_local(&mut self, offset: usize, _: &ValType) {
        self.events.push(Event::LoadLocal(offset));
    }

    fn store_local(&mut self, offset: usize, _: &ValType) {
        self.events.push(Event::StoreLocal(offset));
    }

    fn load_element(&mut self, elem: Scalar) {
        self.events.push(Event::LoadElement(elem));
    }

    fn store_element(&mut self, elem: Scalar) {
        self.events.push(Event::StoreElement(elem));
    }

    fn push_integer(&mut self, val: i32) {
        self.events.push(Event::PushInteger(val));
    }

    fn push_boolean(&mut self, val: bool) {
        self.events.push(Event::PushBoolean(val));
    }

    fn binary(&mut self, op: BOp) {
        self.events.push(Event::Binary(op));
    }

    fn compare(&mut self, cond: Cond) {
        self.events.push(Event::Compare(cond));
    }

    fn negate(&mut self) {
        self.events.push(Event::Negate);
    }

    fn not(&mut self) {
        self.events.push(Event::Not);
    }

    fn print_string(&mut self, text: &str) {
        self.events.push(Event::PrintString(text.to_string()));
    }

    fn print_value(&mut self, ty: Scalar) {
        self.events.push(Event::PrintValue(ty));
    }

    fn read_value(&mut self, ty: Scalar) {
        self.events.push(Event::ReadValue(ty));
    }

    fn call(&mut self, name: &str, prop: &IdProp) {
        self.events.push(Event::Call(name.to_string(), prop.params().len()));
    }

    fn ret(&mut self, ty: Option<&ValType>) {
        self.events.push(Event::Return(ty.cloned()));
    }

    fn new_label(&mut self) -> usize {
        self.labels += 1;
        self.labels
    }

    fn label(&mut self, label: usize) {
        self.events.push(Event::Label(label));
    }

    fn jump(&mut self, label: usize) {
        self.events.push(Event::Jump(label));
    }

    fn jump_if_false(&mut self, label: usize) {
        self.events.push(Event::JumpIfFalse(label));
    }
}
