pub mod client;
pub mod gql;
pub mod models;

pub use client::HelixClient;
pub use gql::GqlClient;
