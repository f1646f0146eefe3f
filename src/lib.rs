//! Blogicum - a small blogging site
//!
//! Authors publish posts filed under categories and places, readers comment
//! on them, and staff keep order through the administration console.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod templates;
pub mod web;
