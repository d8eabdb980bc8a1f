//! Adapters: implementations of the ports and the outer HTTP surfaces.

pub mod http;
pub mod metrics;
pub mod persistence;
pub mod pricing;
pub mod session;
