pub mod conf;
pub mod core;
pub mod frame;
pub mod io;
pub mod session;
pub mod walkthrough;

pub use frame::DataFrame;
pub use session::Session;

#[cfg(feature = "testutil")]
pub mod testutil;
