pub mod api;
pub mod server;

pub use api::AppState;
pub use server::{router, start_server};
