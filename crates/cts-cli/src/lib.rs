//! Library side of the `cts` binary: logging setup, settings, the run
//! pipeline and terms-file parsing.

pub mod logging;
pub mod pipeline;
pub mod settings;
pub mod terms;
