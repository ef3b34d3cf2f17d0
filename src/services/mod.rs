pub mod identity;
pub mod ledger;
pub mod registry;
pub mod summary;
