
pub mod geodesy;
pub mod histogram;
pub mod polar;
pub mod sbs;
pub mod tracker;
pub mod snapshot;
pub mod coordinator;
pub mod config;
pub mod constants;
