//! Process-wide tracing setup shared by the netwatch binaries.

mod subscriber;

pub use subscriber::init_tracing;
