//! Core traits and numeric constraints shared by the Tributary crates.

mod component;

pub mod constraint;

pub use component::Component;
