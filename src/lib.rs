#![forbid(unsafe_code)]

pub mod build;
pub mod catalog;
pub mod claat;
pub mod cli;
pub mod error;
pub mod favicon;
pub mod logging;
pub mod retry;
pub mod selection;
pub mod validate;
