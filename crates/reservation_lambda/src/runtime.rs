pub use reservation_core::{contract, normalizer, query, slots, storage_keys};
