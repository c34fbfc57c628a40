pub mod c_string;
pub mod context;
pub mod emit;
pub mod generator;
pub mod preamble;
pub mod translate;
pub mod writer;

pub use emit::{EmitError, emit_program};
pub use translate::{Translation, translate};
