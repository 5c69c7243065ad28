//! Ports - abstraction layer for external collaborators.
//!
//! Each trait hides an external system behind an interface the core can
//! be tested against: the payment network, object storage, and the
//! clock. Dev implementations live in `crate::impls`.

pub mod clock;
pub mod object_store;
pub mod payment;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::object_store::{MAX_UPLOAD_BYTES, UPLOAD_TTL_SECS, UploadAuthorizer, UploadGrant};
pub use self::payment::{PaymentVerifier, PayoutNetwork};
