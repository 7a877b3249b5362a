//! Test utilities for the admission pipeline.

mod builders;
mod keeper;
mod logging;
mod signer;

pub use builders::*;
pub use keeper::*;
pub use logging::*;
pub use signer::*;
