//! Merge rules as pure functions over the sync envelope. Nothing here touches
//! storage; callers load local state, call in, and write the result back.

pub mod goals;
pub mod settings;
pub mod transactions;
