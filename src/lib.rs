//! Beyond2C - backend for the Beyond2C climate platform
//!
//! Serves the blog, the community "voices" stories, the mirrored WordPress
//! news feed, and the admin panel API.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
