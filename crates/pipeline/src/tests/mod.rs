//! End-to-end runs of the pipeline against in-crate fakes.

mod config_wiring;
