use crate::state::AppState;
use axum::Router;

pub mod draft;
pub mod dto;
pub mod form;
pub mod handlers;
pub mod services;

#[cfg(test)]
pub(crate) mod fakes;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::registration_routes())
}
