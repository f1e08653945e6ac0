pub mod address;
pub mod config;
pub mod error;
pub mod position;
pub mod routing;
pub mod scheduler;
pub mod transport;

pub use error::Error;
