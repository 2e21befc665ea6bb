//! Persistence of fetched rate maps

pub mod disk;

pub use disk::{read_rates, write_rates};
