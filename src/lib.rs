pub mod config;
pub mod continuous;
pub mod demo;
pub mod error;
pub mod eventlist;
pub mod sim;

pub use error::{SimError, SimResult};

#[cfg(test)]
mod test;
