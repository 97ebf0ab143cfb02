//! Session management for anonymized crawling
//!
//! This module provides:
//! - The user agent pool sessions draw their identity from
//! - The control port client that requests a new network path
//! - Session construction through the anonymizing proxy

mod control;
mod identity;
mod provisioner;

pub use control::{ControlPort, IdentityRenewer};
pub use identity::IdentityPool;
pub use provisioner::{Session, SessionProvisioner};
