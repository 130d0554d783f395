//! Bookstore Core — shared domain abstractions.
//!
//! This crate defines the models, events, repository seam and error taxonomy
//! that the gateway and the backend services share. It contains no
//! infrastructure code.

pub mod clock;
pub mod error;
pub mod event;
pub mod model;
pub mod repository;
