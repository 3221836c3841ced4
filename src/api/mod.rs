pub mod handlers;
pub mod server;
pub mod stream;

pub use handlers::AppState;
pub use server::{build_router, run_server, ServerConfig};
