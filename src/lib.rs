pub mod config;
pub mod error;
pub mod film;
pub mod filter;
pub mod math;
pub mod prelude;
