pub mod app;
pub mod routes;
pub mod websocket;
pub mod static_files;

pub use app::*;
pub use routes::*;
pub use websocket::*;
pub use static_files::*;
