//! Synchronization primitives.

pub mod cancel;

pub use cancel::CancelToken;
