pub mod app;
mod error;
mod extract;
mod http_routes;
pub mod state;
