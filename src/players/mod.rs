//! Player identity bookkeeping

pub mod registry;

pub use registry::PlayerRegistry;
