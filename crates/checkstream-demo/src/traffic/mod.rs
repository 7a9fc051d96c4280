pub mod controller;
pub mod generator;
pub mod templates;

pub use controller::*;
pub use generator::*;
pub use templates::*;
