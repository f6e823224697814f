pub mod auth;
pub mod resource;
pub mod restore_jobs;
pub mod state;
