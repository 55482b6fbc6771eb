//! Decode pipeline glue.
//!
//! Wires the stages together in order:
//! normalize -> content box -> validate -> grid -> per-question locate/classify.
//!
//! Algorithmic primitives live in `crate::preprocess`, `crate::sheet`,
//! `crate::grid` and `crate::bubble`. This layer owns stage boundaries, the
//! cancellation check and the shape of the result.

mod result;
mod run;

pub use result::SheetScan;

pub(crate) use run::scan_gray;
