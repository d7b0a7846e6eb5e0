pub mod config;
pub mod error;
pub mod location;
mod handle;
mod session;

#[cfg(test)]
mod scripted_provider;

pub use config::*;
pub use error::*;
pub use handle::SessionHandle;
pub use location::*;
pub use session::*;
