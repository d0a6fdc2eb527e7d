// SPDX-License-Identifier: GPL-2.0-only

//
// Single pass compiler for the ALAN language
//

pub mod driver;
pub mod error;
pub mod gen;
pub mod hashtab;
pub mod lex;
pub mod syntax;

pub use error::{DriverError,Error,ErrorKind,Pos};
pub use gen::Gen;

/// Translate the source text "data", streaming code to "gen"
pub fn compile<G: Gen>(data: &str, gen: &mut G, trace: bool) -> error::Result<()> {
    syntax::parse_file(data, gen, trace)
}
