// SPDX-License-Identifier: GPL-2.0-only

//
// Code generation backend for the Jasmin JVM assembler
//

use super::{BOp,Cond,Gen};
use crate::error::DriverError;
use crate::syntax::{IdProp,Scalar,ValType};

use std::path::{Path,PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn descriptor(ty: &ValType) -> &'static str {
    match ty {
        ValType::Integer => "I",
        ValType::Boolean => "Z",
        ValType::Array(Scalar::Integer) => "[I",
        ValType::Array(Scalar::Boolean) => "[Z",
        ValType::None | ValType::Callable(_) => "V",
    }
}

fn method_descriptor(params: &[ValType], ret: &ValType) -> String {
    let params: String = params.iter().map(descriptor).collect();
    format!("({}){}", params, descriptor(ret))
}

fn array_type(elem: Scalar) -> &'static str {
    match elem {
        Scalar::Integer => "int",
        Scalar::Boolean => "boolean",
    }
}

// Jasmin understands the same escapes as the source language
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            ch => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

//
// Method being generated
//

struct Method {
    header: String,
    ret: ValType,
    // JVM slot of offset 1
    base: usize,
    code: Vec<String>,
    locals: usize,
    stack: isize,
    max_stack: isize,
}

impl Method {
    fn new(header: String, ret: &ValType, base: usize, params: usize) -> Method {
        Method {
            header: header,
            ret: ret.clone(),
            base: base,
            code: Vec::new(),
            locals: base + params,
            stack: 0,
            max_stack: 0,
        }
    }
}

pub struct Jasmin {
    class: String,
    methods: Vec<String>,
    cur: Method,
    labels: usize,
    // Whether the shared input scanner is needed
    reads: bool,
    text: String,
}

impl Jasmin {
    pub fn new() -> Jasmin {
        Jasmin {
            class: String::new(),
            methods: Vec::new(),
            cur: Method::new(String::new(), &ValType::None, 0, 0),
            labels: 0,
            reads: false,
            text: String::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Assembly text, complete once end_program has been seen
    pub fn assembly(&self) -> &str {
        &self.text
    }

    // Emit an instruction and account for its effect on the operand stack
    fn op(&mut self, delta: isize, ins: String) {
        let method = &mut self.cur;
        method.code.push(format!("\t{}", ins));
        method.stack += delta;
        if method.stack > method.max_stack {
            method.max_stack = method.stack;
        }
    }

    fn raw(&mut self, line: String) {
        self.cur.code.push(line);
    }

    fn slot(&mut self, offset: usize) -> usize {
        let method = &mut self.cur;
        let slot = method.base + offset - 1;
        if slot + 1 > method.locals {
            method.locals = slot + 1;
        }
        slot
    }

    fn begin_method(&mut self, header: String, params: usize, ret: &ValType, base: usize) {
        self.cur = Method::new(header, ret, base, params);
    }

    fn next_label(&mut self) -> usize {
        self.labels += 1;
        self.labels
    }
}

impl Gen for Jasmin {
    type Label = usize;

    fn begin_program(&mut self, name: &str) {
        self.class = name.to_string();
    }

    fn begin_subroutine(&mut self, name: &str, params: &[ValType], ret: &ValType) {
        let header = format!(".method public static {}{}", name, method_descriptor(params, ret));
        self.begin_method(header, params.len(), ret, 0);
    }

    fn begin_main(&mut self) {
        // Slot 0 holds the command line arguments
        let header = ".method public static main([Ljava/lang/String;)V".to_string();
        self.begin_method(header, 0, &ValType::None, 1);
    }

    fn end_subroutine(&mut self, width: usize) {
        // Functions that run off their end return a default value
        match self.cur.ret.clone() {
            ValType::None => (),
            ValType::Array(_) => {
                self.op(1, "aconst_null".to_string());
                self.op(-1, "areturn".to_string());
            },
            _ => {
                self.op(1, "iconst_0".to_string());
                self.op(-1, "ireturn".to_string());
            },
        }

        if self.cur.base + width > self.cur.locals {
            self.cur.locals = self.cur.base + width;
        }

        let method = std::mem::replace(&mut self.cur, Method::new(String::new(), &ValType::None, 0, 0));
        let mut text = String::new();
        text.push_str(&method.header);
        text.push('\n');
        text.push_str(&format!("\t.limit stack {}\n", method.max_stack.max(1)));
        text.push_str(&format!("\t.limit locals {}\n", method.locals.max(1)));
        for line in &method.code {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(".end method\n");
        self.methods.push(text);
    }

    fn end_program(&mut self) {
        let mut text = String::new();
        text.push_str(&format!(".class public {}\n", self.class));
        text.push_str(".super java/lang/Object\n\n");

        if self.reads {
            text.push_str(".field private static scanner Ljava/util/Scanner;\n\n");
            text.push_str(".method static <clinit>()V\n");
            text.push_str("\t.limit stack 3\n");
            text.push_str("\t.limit locals 0\n");
            text.push_str("\tnew java/util/Scanner\n");
            text.push_str("\tdup\n");
            text.push_str("\tgetstatic java/lang/System/in Ljava/io/InputStream;\n");
            text.push_str("\tinvokespecial java/util/Scanner/<init>(Ljava/io/InputStream;)V\n");
            text.push_str(&format!("\tputstatic {}/scanner Ljava/util/Scanner;\n", self.class));
            text.push_str("\treturn\n");
            text.push_str(".end method\n\n");
        }

        text.push_str(".method public <init>()V\n");
        text.push_str("\taload_0\n");
        text.push_str("\tinvokenonvirtual java/lang/Object/<init>()V\n");
        text.push_str("\treturn\n");
        text.push_str(".end method\n");

        for method in &self.methods {
            text.push('\n');
            text.push_str(method);
        }
        self.text = text;
    }

    fn declare_scalar(&mut self, offset: usize, _: Scalar) {
        let slot = self.slot(offset);
        self.op(1, "iconst_0".to_string());
        self.op(-1, format!("istore {}", slot));
    }

    fn declare_array(&mut self, offset: usize, _: Scalar) {
        let slot = self.slot(offset);
        self.op(1, "aconst_null".to_string());
        self.op(-1, format!("astore {}", slot));
    }

    fn new_array(&mut self, elem: Scalar) {
        self.op(0, format!("newarray {}", array_type(elem)));
    }

    fn load_local(&mut self, offset: usize, ty: &ValType) {
        let slot = self.slot(offset);
        if ty.is_array() {
            self.op(1, format!("aload {}", slot));
        } else {
            self.op(1, format!("iload {}", slot));
        }
    }

    fn store_local(&mut self, offset: usize, ty: &ValType) {
        let slot = self.slot(offset);
        if ty.is_array() {
            self.op(-1, format!("astore {}", slot));
        } else {
            self.op(-1, format!("istore {}", slot));
        }
    }

    fn load_element(&mut self, elem: Scalar) {
        match elem {
            Scalar::Integer => self.op(-1, "iaload".to_string()),
            Scalar::Boolean => self.op(-1, "baload".to_string()),
        }
    }

    fn store_element(&mut self, elem: Scalar) {
        match elem {
            Scalar::Integer => self.op(-3, "iastore".to_string()),
            Scalar::Boolean => self.op(-3, "bastore".to_string()),
        }
    }

    fn push_integer(&mut self, val: i32) {
        let ins = match val {
            -1 => "iconst_m1".to_string(),
            0..=5 => format!("iconst_{}", val),
            -128..=127 => format!("bipush {}", val),
            -32768..=32767 => format!("sipush {}", val),
            _ => format!("ldc {}", val),
        };
        self.op(1, ins);
    }

    fn push_boolean(&mut self, val: bool) {
        self.op(1, if val { "iconst_1" } else { "iconst_0" }.to_string());
    }

    fn binary(&mut self, op: BOp) {
        let ins = match op {
            BOp::Add => "iadd",
            BOp::Sub => "isub",
            BOp::Mul => "imul",
            BOp::Div => "idiv",
            BOp::Rem => "irem",
            BOp::And => "iand",
            BOp::Or  => "ior",
        };
        self.op(-1, ins.to_string());
    }

    fn compare(&mut self, cond: Cond) {
        let ins = match cond {
            Cond::Eq => "if_icmpeq",
            Cond::Ne => "if_icmpne",
            Cond::Lt => "if_icmplt",
            Cond::Le => "if_icmple",
            Cond::Gt => "if_icmpgt",
            Cond::Ge => "if_icmpge",
        };
        let ltrue = self.next_label();
        let lend = self.next_label();

        // Both paths leave exactly one boolean in place of the two operands
        self.op(-2, format!("{} L{}", ins, ltrue));
        self.op(1, "iconst_0".to_string());
        self.op(0, format!("goto L{}", lend));
        self.raw(format!("L{}:", ltrue));
        self.raw("\ticonst_1".to_string());
        self.raw(format!("L{}:", lend));
    }

    fn negate(&mut self) {
        self.op(0, "ineg".to_string());
    }

    fn not(&mut self) {
        self.op(1, "iconst_1".to_string());
        self.op(-1, "ixor".to_string());
    }

    fn print_string(&mut self, text: &str) {
        self.op(1, "getstatic java/lang/System/out Ljava/io/PrintStream;".to_string());
        self.op(1, format!("ldc {}", quote(text)));
        self.op(-2, "invokevirtual java/io/PrintStream/print(Ljava/lang/String;)V".to_string());
    }

    fn print_value(&mut self, ty: Scalar) {
        let desc = descriptor(&ty.into());
        self.op(1, "getstatic java/lang/System/out Ljava/io/PrintStream;".to_string());
        self.op(0, "swap".to_string());
        self.op(-2, format!("invokevirtual java/io/PrintStream/print({})V", desc));
    }

    fn read_value(&mut self, ty: Scalar) {
        self.reads = true;
        let method = match ty {
            Scalar::Integer => "nextInt()I",
            Scalar::Boolean => "nextBoolean()Z",
        };
        let class = self.class.clone();
        self.op(1, format!("getstatic {}/scanner Ljava/util/Scanner;", class));
        self.op(0, format!("invokevirtual java/util/Scanner/{}", method));
    }

    fn call(&mut self, name: &str, prop: &IdProp) {
        let ret = match &prop.ty {
            ValType::Callable(sig) => sig.ret.clone(),
            _ => ValType::None,
        };
        let params = prop.params();
        let mut delta = -(params.len() as isize);
        if ret != ValType::None {
            delta += 1;
        }
        let ins = format!("invokestatic {}/{}{}", self.class, name, method_descriptor(params, &ret));
        self.op(delta, ins);
    }

    fn ret(&mut self, ty: Option<&ValType>) {
        match ty {
            None => self.op(0, "return".to_string()),
            Some(ty) if ty.is_array() => self.op(-1, "areturn".to_string()),
            Some(_) => self.op(-1, "ireturn".to_string()),
        }
    }

    fn new_label(&mut self) -> usize {
        self.next_label()
    }

    fn label(&mut self, label: usize) {
        self.raw(format!("L{}:", label));
    }

    fn jump(&mut self, label: usize) {
        self.op(0, format!("goto L{}", label));
    }

    fn jump_if_false(&mut self, label: usize) {
        self.op(-1, format!("ifeq L{}", label));
    }
}

/// Assemble "asm" with the Jasmin jar, leaving "<class>.class" in "out_dir"
pub fn assemble(asm: &str, class: &str, jasmin: &Path, out_dir: &Path) -> Result<PathBuf, DriverError> {
    let tdir = tempdir()?;
    let tasm = tdir.path().join(format!("{}.j", class));
    std::fs::write(&tasm, asm)
        .map_err(|err| DriverError::Write { path: tasm.clone(), source: err })?;

    let status = Command::new("java")
        .arg("-jar")
        .arg(jasmin)
        .arg("-d")
        .arg(out_dir)
        .arg(&tasm)
        .status()
        .map_err(DriverError::Spawn)?;

    if !status.success() {
        return Err(DriverError::Assembler(status));
    }
    Ok(out_dir.join(format!("{}.class", class)))
}
