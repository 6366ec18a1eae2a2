// src/lib.rs — Library root for the Nekota client

pub mod api;
pub mod auth;
pub mod cli;
pub mod dashboard;
pub mod infra;
pub mod routes;
pub mod session;
pub mod util;
