pub mod aggregator;
pub mod config;
pub mod error;
pub mod lastfm;
pub mod logging;
pub mod render;
pub mod web;
