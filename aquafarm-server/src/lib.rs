pub mod api;
pub mod auth;
pub mod config;
pub mod registry;

use auth::AuthConfig;

// AppState must be defined in lib.rs to be visible to all modules
#[derive(Clone)]
pub struct AppState<C, S, M, U> {
    pub catalog: C,
    pub stocking: S,
    pub monitoring: M,
    pub users: U,
    pub auth: AuthConfig,
}
