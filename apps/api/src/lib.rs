pub mod candidates;
pub mod config;
pub mod db;
pub mod errors;
pub mod extraction;
pub mod llm_client;
pub mod models;
pub mod parsing;
pub mod routes;
pub mod state;
