//! vaxtrack: role-based client for the vaccination and inventory API.
//!
//! The binary in `main.rs` is a thin clap front end over [`cli`]; everything
//! else is usable as a library, with [`api::Backend`] and
//! [`view::Renderer`] as the seams for substituting the network and the
//! terminal.

pub mod activity;
pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod router;
pub mod session;
pub mod view;
