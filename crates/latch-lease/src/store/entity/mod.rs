//! SeaORM entities for the lease store

pub mod lease;
