//! Command handlers for the TaxGPT CLI.

pub mod ask;
pub mod serve;

#[cfg(test)]
pub(crate) mod fakes;

pub use ask::AskCommand;
pub use serve::ServeCommand;
