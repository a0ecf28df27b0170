pub mod api;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod phrases;
pub mod practise;
pub mod session;
pub mod state;
pub mod validation;

pub use handlers::router;
pub use state::AppState;
