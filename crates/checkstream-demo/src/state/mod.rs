pub mod app_state;
pub mod event_bus;
pub mod metrics_collector;

pub use app_state::*;
pub use event_bus::*;
pub use metrics_collector::*;
