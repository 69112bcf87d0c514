//! The production [`Directory`] implementation.
//!
//! Talks to three upstream services: the congressional data API
//! (legislators, bills, votes), the campaign-finance API (entity lookups,
//! contributor aggregates, biographies), and the election-office API. Zip
//! code lookups and campaign-finance entity ids are cached in SQLite
//! because they are hit on nearly every call and change rarely.
//!
//! [`Directory`]: capitolcall_flow::Directory

mod cache;
mod client;
mod parse;

pub use client::{CongressClient, CongressConfig};
