use alanc::gen::jasmin::Jasmin;
use alanc::gen::record::{Event,Recorder};
use alanc::gen::Gen;
use alanc::syntax::ValType;
use alanc::{compile,ErrorKind};

const HELLO: &str = include_str!("programs/hello.alan");
const FACT: &str = include_str!("programs/fact.alan");
const SORT: &str = include_str!("programs/sort.alan");

fn jasmin(src: &str) -> Jasmin {
    let mut gen = Jasmin::new();
    compile(src, &mut gen, false).unwrap();
    gen
}

#[test]
fn hello_world() {
    let gen = jasmin(HELLO);
    assert_eq!(gen.class_name(), "hello");
    assert_eq!(gen.assembly(), "\
.class public hello
.super java/lang/Object

.method public <init>()V
\taload_0
\tinvokenonvirtual java/lang/Object/<init>()V
\treturn
.end method

.method public static main([Ljava/lang/String;)V
\t.limit stack 2
\t.limit locals 1
\tgetstatic java/lang/System/out Ljava/io/PrintStream;
\tldc \"Hello world!\\n\"
\tinvokevirtual java/io/PrintStream/print(Ljava/lang/String;)V
\treturn
.end method
");
}

#[test]
fn recursive_function() {
    let gen = jasmin(FACT);
    let asm = gen.assembly();
    assert!(asm.contains(".method public static fact(I)I\n"));
    assert!(asm.contains("\tinvokestatic fact/fact(I)I\n"));
    assert!(asm.contains("\tif_icmple L"));
    // Parameters of subroutines start at slot 0, main variables at slot 1
    assert!(asm.contains("\tiload 0\n"));
    assert!(asm.contains("\tistore 1\n"));
    assert!(asm.contains("\tinvokevirtual java/io/PrintStream/print(I)V\n"));
    // Falling off the end of a function returns a default value
    assert!(asm.contains("\ticonst_0\n\tireturn\n.end method\n"));
    assert!(!asm.contains("scanner"));
}

#[test]
fn arrays_and_input() {
    let gen = jasmin(SORT);
    let asm = gen.assembly();
    assert!(asm.contains(".field private static scanner Ljava/util/Scanner;\n"));
    assert!(asm.contains(".method static <clinit>()V\n"));
    assert!(asm.contains("\tgetstatic sort/scanner Ljava/util/Scanner;\n"));
    assert!(asm.contains("\tinvokevirtual java/util/Scanner/nextInt()I\n"));
    assert!(asm.contains(".method public static swap([III)V\n"));
    assert!(asm.contains("\tinvokestatic sort/swap([III)V\n"));
    assert!(asm.contains("\tnewarray int\n"));
    assert!(asm.contains("\tiastore\n"));
    assert!(asm.contains("\tiaload\n"));
}

#[test]
fn event_stream_shape() {
    let mut rec = Recorder::new();
    compile(SORT, &mut rec, false).unwrap();
    let subroutines = rec.events.iter()
        .filter(|event| matches!(event, Event::BeginSubroutine(..) | Event::BeginMain))
        .count();
    let ends = rec.events.iter().filter(|event| matches!(event, Event::EndSubroutine(_))).count();
    assert_eq!(subroutines, 2);
    assert_eq!(ends, 2);
    assert_eq!(rec.events.first(), Some(&Event::BeginProgram("sort".to_string())));
    assert_eq!(rec.events.last(), Some(&Event::EndProgram));
}

#[test]
fn tracing_does_not_change_output() {
    let mut quiet = Recorder::new();
    let mut traced = Recorder::new();
    compile(FACT, &mut quiet, false).unwrap();
    compile(FACT, &mut traced, true).unwrap();
    assert_eq!(quiet.events, traced.events);
}

#[test]
fn first_error_is_reported() {
    let src = "source p\nbegin\n  integer x;\n  x := 1 = 1;\n  x := true\nend\n";
    let err = compile(src, &mut Recorder::new(), false).unwrap_err();
    assert_eq!(err.to_string(),
        "4:8: incompatible types (expected integer, found boolean) for assignment to 'x'");
}

#[test]
fn unclosed_comment() {
    let src = "source p\nbegin\n  relax\nend\n{ outer { inner }\n";
    let err = compile(src, &mut Recorder::new(), false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::CommentNotClosed);
    assert_eq!(err.pos.line, 5);
}

#[test]
fn locals_limit_covers_subroutine_width() {
    let mut gen = Jasmin::new();
    gen.begin_program("w");
    gen.begin_subroutine("f", &[ValType::Integer], &ValType::None);
    gen.ret(None);
    gen.end_subroutine(4);
    gen.begin_main();
    gen.ret(None);
    gen.end_subroutine(2);
    gen.end_program();

    let asm = gen.assembly();
    assert!(asm.contains(".method public static f(I)V\n\t.limit stack 1\n\t.limit locals 4\n"));
    assert!(asm.contains(".method public static main([Ljava/lang/String;)V\n\t.limit stack 1\n\t.limit locals 3\n"));
}
