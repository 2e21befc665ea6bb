//! Console front-ends for the library commands

pub mod fetch;
pub mod rate;
pub mod setup;
pub mod show;
pub mod ui;
