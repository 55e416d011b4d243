pub mod config;
pub mod dataaccess;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod websocket;
