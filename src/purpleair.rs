mod client;
mod sample;

pub use client::*;
pub use sample::*;
