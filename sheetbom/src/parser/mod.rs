pub mod kicad;
pub mod schema;
pub mod sexp;
pub mod pcb;
pub mod pcb_schema;
pub mod project_file;

// Re-export for convenience
pub use kicad::{KicadParser, KicadParseError};
pub use schema::*;
pub use sexp::{SExp, SExpParser, ParseError};
pub use pcb::{PcbParser, PcbParseError};
pub use pcb_schema::*;
pub use project_file::{ProjectSettings, ProjectFileError};
