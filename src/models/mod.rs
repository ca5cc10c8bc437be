//! Models Module
//!
//! Request and response types exchanged with the transport and the caller.

pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
