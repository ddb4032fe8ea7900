//! Persistence layer: the `Repository` contract and its implementations.

pub mod memory;
pub mod postgres;
pub mod traits;
pub mod unconfigured;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;
pub use traits::{ListPrescriptionsFilter, Repository, StoreStatus};
pub use unconfigured::UnconfiguredRepository;
