pub mod questions;
pub mod scoring;
