//! Data types consumed by the admission pipeline.

mod coin;
pub use coin::*;

mod dec;
pub use dec::*;

mod keys;
pub use keys::*;

mod msg;
pub use msg::*;

mod tx;
pub use tx::*;
