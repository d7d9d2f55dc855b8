//! Last.fm recent-tracks access
//!
//! `parser` turns a `user.getrecenttracks` body into a [`PageResult`],
//! `client` issues the HTTP request behind the [`TrackHistorySource`] seam.
//!
//! [`PageResult`]: scrobbles_common::PageResult

pub mod client;
pub mod parser;

pub use client::{LastFmClient, PageQuery, TrackHistorySource, PAGE_LIMIT};
pub use parser::parse_page;
