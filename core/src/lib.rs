#![cfg_attr(feature = "no-std", no_std)]

pub mod acquisition;
pub mod config;
pub mod evaluator;
pub mod message;
pub mod monitor;
pub mod serial;
pub mod types;

#[cfg(feature = "no-std")]
use defmt::{debug, info, warn};
#[cfg(feature = "std")]
use log::{debug, info, warn};

#[cfg(feature = "std")]
pub type String<const N: usize> = std::string::String;
#[cfg(feature = "no-std")]
pub type String<const N: usize> = heapless::String<N>;
