#[macro_use]
extern crate serde_derive;

pub mod catalog;
pub mod config;
pub mod config_processors;
pub mod endpoints;
pub mod io;
pub mod knn;
pub mod sessions;
pub mod state;
