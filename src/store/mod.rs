//! Versioned, path-addressed value storage.
//!
//! Every path owns a slot with its own lock and a monotonically increasing
//! version stamp. Committed mutations are published to the
//! [`ChangeBus`](crate::ChangeBus) in per-path commit order.

mod entry;
mod slot;
mod versioned_store;

#[cfg(test)]
mod versioned_store_test;

pub use entry::Entry;
pub use versioned_store::VersionedStore;
