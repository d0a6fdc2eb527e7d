// SPDX-License-Identifier: GPL-2.0-only

use alanc::driver::{run,Config};
use clap::{App,Arg,ArgMatches};
use std::path::PathBuf;

fn config_from(matches: &ArgMatches) -> Config {
    let mut config = Config::new(matches.value_of("FILE").unwrap_or_default());
    config.jasmin = matches.value_of("jasmin").map(PathBuf::from);
    if let Some(dir) = matches.value_of("out-dir") {
        config.out_dir = PathBuf::from(dir);
    }
    config.emit_asm = matches.is_present("emit-asm");
    config.tokens = matches.is_present("tokens");
    config.verbose = matches.is_present("verbose");
    config
}

fn main() {
    let matches = App::new("alanc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles ALAN programs to JVM class files")
        .arg(Arg::with_name("FILE")
            .help("Source file to compile")
            .required(true)
            .index(1))
        .arg(Arg::with_name("jasmin")
            .long("jasmin")
            .value_name("JAR")
            .env("JASMIN_JAR")
            .help("Path of the Jasmin assembler jar"))
        .arg(Arg::with_name("out-dir")
            .short("d")
            .long("out-dir")
            .value_name("DIR")
            .help("Directory for the generated files"))
        .arg(Arg::with_name("emit-asm")
            .short("S")
            .long("emit-asm")
            .help("Write Jasmin assembly instead of assembling it"))
        .arg(Arg::with_name("tokens")
            .long("tokens")
            .help("Print the token stream and stop"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .long("verbose")
            .help("Trace the parser and dump symbol tables on stderr"))
        .get_matches();

    let config = config_from(&matches);
    let stdout = std::io::stdout();
    if let Err(err) = run(&config, &mut stdout.lock()) {
        eprintln!("alanc: {}", err);
        std::process::exit(1);
    }
}
