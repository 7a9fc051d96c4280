pub mod cli;
pub mod mock;
pub mod models;
pub mod server;
pub mod state;
pub mod traffic;

pub use cli::*;
pub use models::*;
pub use server::*;
pub use state::*;
