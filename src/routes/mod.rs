mod auth;
mod health_check;

pub use auth::{current_session, login, logout, refresh, register};
pub use auth::{CredentialsRequest, MeResponse, RefreshRequest, SessionResponse};
pub use health_check::health_check;
