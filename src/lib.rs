//! Registration workflow for the MealMind mobile client: turns a registration
//! form draft into a Supabase auth identity plus its `user_profiles` row, and
//! exposes it over a small axum API.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod registration;
pub mod state;
pub mod storage;
pub mod supabase;
