pub mod api;
pub mod config;
pub mod detector;
pub mod recognition;
pub mod state;

pub use config::LprServiceConfig;
pub use state::LprServiceState;
