//! Forum API collaborator: domain types, wire types, and the HTTP client.

pub mod api_types;
pub mod client;
pub mod types;
