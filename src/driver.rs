// SPDX-License-Identifier: GPL-2.0-only

//
// Compiler driver
//

use crate::error::DriverError;
use crate::gen::jasmin::{assemble,Jasmin};
use crate::lex::Lexer;
use std::io::Write;
use std::path::{Path,PathBuf};

/// Everything the command line decides about one compilation
#[derive(Clone,Debug)]
pub struct Config {
    pub file: PathBuf,
    pub jasmin: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub emit_asm: bool,
    pub tokens: bool,
    pub verbose: bool,
}

impl Config {
    pub fn new<P: AsRef<Path>>(file: P) -> Config {
        Config {
            file: file.as_ref().to_path_buf(),
            jasmin: None,
            out_dir: PathBuf::from("."),
            emit_asm: false,
            tokens: false,
            verbose: false,
        }
    }

    fn needs_assembler(&self) -> bool {
        !self.tokens && !self.emit_asm
    }
}

fn dump_tokens<W: Write>(data: &str, file: &str, out: &mut W) -> Result<(), DriverError> {
    let tokens = Lexer::new(data).tokenize()
        .map_err(|err| DriverError::Compile { file: file.to_string(), err: err })?;
    for token in &tokens {
        writeln!(out, "{}: {}", token.pos, token.tok.describe_value())?;
    }
    Ok(())
}

/// Run one compilation, returning the path of the file produced (if any)
pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<Option<PathBuf>, DriverError> {
    let jasmin = match (&config.jasmin, config.needs_assembler()) {
        (Some(jar), true) => Some(jar.as_path()),
        (None, true) => return Err(DriverError::MissingJasmin),
        (_, false) => None,
    };

    let data = std::fs::read_to_string(&config.file)
        .map_err(|err| DriverError::Open { path: config.file.clone(), source: err })?;
    let file = config.file.display().to_string();

    if config.tokens {
        dump_tokens(&data, &file, out)?;
        return Ok(None)
    }

    let mut gen = Jasmin::new();
    crate::compile(&data, &mut gen, config.verbose)
        .map_err(|err| DriverError::Compile { file: file, err: err })?;

    match jasmin {
        Some(jar) => {
            let class = assemble(gen.assembly(), gen.class_name(), jar, &config.out_dir)?;
            Ok(Some(class))
        },
        None => {
            let path = config.out_dir.join(format!("{}.j", gen.class_name()));
            std::fs::write(&path, gen.assembly())
                .map_err(|err| DriverError::Write { path: path.clone(), source: err })?;
            Ok(Some(path))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HELLO: &str = "source hello\nbegin\n  put \"hi\\n\"\nend\n";

    fn write_source(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("prog.alan");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn emit_asm_writes_class_file() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(write_source(dir.path(), HELLO));
        config.out_dir = dir.path().to_path_buf();
        config.emit_asm = true;

        let mut out = Vec::new();
        let path = run(&config, &mut out).unwrap().unwrap();
        assert_eq!(path, dir.path().join("hello.j"));
        let asm = std::fs::read_to_string(&path).unwrap();
        assert!(asm.starts_with(".class public hello\n"));
        assert!(asm.contains("ldc \"hi\\n\""));
        assert!(out.is_empty());
    }

    #[test]
    fn token_dump() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(write_source(dir.path(), "source x\n  42"));
        config.tokens = true;

        let mut out = Vec::new();
        assert_eq!(run(&config, &mut out).unwrap(), None);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "1:1: source\n1:8: identifier x\n2:3: number 42\n2:5: end-of-file\n");
    }

    #[test]
    fn missing_assembler() {
        let dir = tempdir().unwrap();
        let config = Config::new(write_source(dir.path(), HELLO));
        match run(&config, &mut Vec::new()) {
            Err(DriverError::MissingJasmin) => (),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn unreadable_source() {
        let dir = tempdir().unwrap();
        let mut config = Config::new(dir.path().join("absent.alan"));
        config.emit_asm = true;
        match run(&config, &mut Vec::new()) {
            Err(DriverError::Open { path, .. }) => assert_eq!(path, dir.path().join("absent.alan")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn compile_error_names_file() {
        let dir = tempdir().unwrap();
        let path = write_source(dir.path(), "source bad\nbegin\n  x := 1\nend\n");
        let mut config = Config::new(&path);
        config.emit_asm = true;
        config.out_dir = dir.path().to_path_buf();

        let err = run(&config, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), format!("{}:3:3: unknown identifier 'x'", path.display()));
        assert!(!dir.path().join("bad.j").exists());
    }
}
