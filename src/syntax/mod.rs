mod parser;
mod symtab;
mod types;

use crate::error::Result;
use crate::gen::Gen;

pub use parser::Parser;
pub use symtab::SymTab;
pub use types::{IdProp,Scalar,Signature,ValType};

/// Translate "data", sending the generated code to "gen"
pub fn parse_file<G: Gen>(data: &str, gen: &mut G, trace: bool) -> Result<()> {
    let mut parser = Parser::new(data, gen)?.with_trace(trace);
    parser.want_source()
}
