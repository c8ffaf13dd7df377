//! Fact table derivation.
//!
//! Inspects a [`HostProbe`](crate::probe::HostProbe) once and condenses what it finds
//! into an immutable [`FactTable`] of named booleans.
pub mod checks;
mod detect;
mod facts;

pub use detect::{detect_container, detect_facts, web_socket};
pub use facts::{Fact, FactTable, Mode, RuntimeKind, UnknownFact};
