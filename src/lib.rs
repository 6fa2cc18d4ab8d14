pub mod config;
pub mod db_client;
pub mod encryption_engine;
pub mod error;
pub mod file_server;
pub mod listings;
pub mod payment_gateway;
pub mod routes;
pub mod search;
pub mod state;
pub mod store;
pub mod users;
