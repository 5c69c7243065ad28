//! Application layer: the Marketplace service.

mod marketplace;

pub use marketplace::Marketplace;
