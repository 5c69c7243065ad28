//! Dev implementations of the ports (for local runs and tests).

mod dev_object_store;
mod dev_payment;

pub use dev_object_store::DevUploadAuthorizer;
pub use dev_payment::{DevPaymentVerifier, DevPayoutNetwork};
