use crate::state::AppState;
use axum::Router;

mod dto;
pub mod entity;
mod error;
pub mod handlers;
mod password;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
