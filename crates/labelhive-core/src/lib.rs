//! labelhive-core
//!
//! Core building blocks for the labelhive micro-task marketplace:
//! requesters fund image-labeling tasks, workers answer them and accrue
//! pending earnings, and earnings get locked into payouts.
//!
//! # Module layout
//! - **domain**: domain model (ids, accounts, tasks, submissions, payouts, views)
//! - **ports**: abstraction layer for external collaborators
//!   (Clock, PaymentVerifier, PayoutNetwork, UploadAuthorizer)
//! - **store**: MarketStore port + in-memory transactional implementation
//! - **app**: Marketplace service composing store and ports
//! - **impls**: dev implementations of the ports (in-memory / stubbed)
//!
//! # Consistency model
//! Every mutating operation is a single transaction against the store:
//! all preconditions are checked before the first mutation, and either
//! every effect commits or none does. External collaborators (payment
//! network, object storage) are only called outside transaction
//! boundaries, so local consistency never depends on external liveness.

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod store;

pub use error::MarketError;
