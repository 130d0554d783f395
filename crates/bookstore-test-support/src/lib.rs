//! Shared test fakes for the bookstore catalog services.

mod cache;
mod clock;
mod producer;
mod repository;

pub use cache::FailingCache;
pub use clock::FixedClock;
pub use producer::{FailingProducer, RecordingProducer};
pub use repository::{FailingRepository, FlakyRepository};
