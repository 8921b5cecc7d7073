#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can name `BigUint` without depending
// on `num-bigint` directly.
pub use num_bigint;
pub use reqwest::Url;
