mod validate;
mod writer;

pub use validate::{ValidationReport, validate_dtbook, validate_dtbook_file};
pub use writer::{write_dtbook, write_dtbook_file};
