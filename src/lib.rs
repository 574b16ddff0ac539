//! Linkhub - a link registry, admin verification and chat service over a
//! single-writer actor store.

pub mod admin;
pub mod build_info;
pub mod chat;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod links;
pub mod llm;
pub mod ratelimit;
pub mod server;
pub mod store;
