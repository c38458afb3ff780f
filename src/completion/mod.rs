//! Chat-completion backend integration.

pub mod client;

pub use client::CompletionClient;
