pub mod config;
pub mod consts;
pub mod error;
pub mod estimate;
pub mod features;
pub mod frame;
pub mod io;
pub mod preprocess;
pub mod session;
pub mod tracker;
