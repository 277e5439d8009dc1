//! Top-level facade crate for usagewatch.
//!
//! Re-exports the snapshot model and the gateway library so users can depend on a single crate.

pub mod core {
    pub use usagewatch_core::*;
}

pub mod gateway {
    pub use usagewatch_gateway::*;
}
