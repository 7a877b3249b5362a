//! Transaction admission pipeline for a Cosmos SDK chain with an Ethereum execution layer.
//!
//! [`AnteHandler`] runs every transaction through an ordered chain of checks before any of its
//! messages execute: gas metering, nested message restrictions, fee floors, block gas wanted
//! accounting, signature verification, vesting balance guards, sequence increments and fee
//! deduction. State is read and written through the collaborator traits in [`AnteEnvs`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod ante;
pub use ante::*;

mod context;
pub use context::*;

mod error;
pub use error::*;

pub mod fee_market;

mod gas;
pub use gas::*;

mod keeper;
pub use keeper::*;

mod params;
pub use params::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod types;
pub use types::*;
