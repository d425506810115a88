//! Module assembler
//!
//! The templating pass that turns fragment folders plus a root descriptor
//! into one distributable module file, with cross-file prologue metadata
//! deduplicated and hoisted to the top.

mod assembler;
mod fragment;

pub use assembler::{
    assemble, check_descriptor, write_assembled, INLINE_REGION_END, INLINE_REGION_START,
};
pub use fragment::Fragment;
