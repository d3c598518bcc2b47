pub mod auth;
pub mod worker;

pub use auth::AuthGuard;
pub use worker::WorkerGuard;
