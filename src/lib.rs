pub mod audit;
pub mod authz;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
