pub mod allowlist;
pub mod error;
pub mod handlers;
pub mod server;

pub use allowlist::IpAllowlist;
pub use error::ApiError;
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
