#[macro_use]
extern crate lazy_static;

pub mod chain;
pub mod config;
pub mod constants;
pub mod logging;
pub mod record;
