//! Service seams the engine drives the outside world through.

use crate::error::StoreError;
use async_trait::async_trait;
use capitolcall_types::{Bill, Contributor, ElectionOffice, Legislator, UpcomingBill, Vote};
use thiserror::Error;

/// Errors from the congressional directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The upstream API request failed (network, HTTP status, timeout).
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// The upstream response arrived but could not be interpreted.
    #[error("unexpected upstream payload: {0}")]
    Payload(String),

    /// The local lookup cache could not be read or written.
    #[error("lookup cache error: {0}")]
    Cache(String),
}

/// Lookup service for legislators, bills, votes, contributions, and
/// election offices.
///
/// The engine never talks to an HTTP API directly; it asks the directory
/// and reads whatever comes back. The production implementation caches
/// zip-code and entity-id lookups in SQLite, but callers cannot tell.
#[async_trait]
pub trait Directory: Send + Sync {
    /// All current members of Congress whose district overlaps the zip code.
    async fn legislators_for_zip(&self, zipcode: &str) -> Result<Vec<Legislator>, DirectoryError>;

    /// A single member by canonical id.
    async fn legislator_by_bioguide(
        &self,
        bioguide_id: &str,
    ) -> Result<Option<Legislator>, DirectoryError>;

    /// A short spoken biography for the member, if one is published.
    async fn legislator_bio(
        &self,
        legislator: &Legislator,
    ) -> Result<Option<String>, DirectoryError>;

    /// Top campaign contributors for the member's current cycle.
    async fn top_contributors(
        &self,
        legislator: &Legislator,
    ) -> Result<Vec<Contributor>, DirectoryError>;

    /// The member's most recent roll-call votes, newest first.
    async fn recent_votes(&self, bioguide_id: &str) -> Result<Vec<Vote>, DirectoryError>;

    /// Committee and subcommittee names the member sits on, flattened for
    /// reading aloud.
    async fn committees(&self, legislator: &Legislator) -> Result<Vec<String>, DirectoryError>;

    /// Bills scheduled for floor debate in the coming days.
    async fn upcoming_bills(&self) -> Result<Vec<UpcomingBill>, DirectoryError>;

    /// Bills whose number matches the caller's search, most recent session
    /// first, capped to a readable handful.
    async fn bill_search(&self, number: u32) -> Result<Vec<Bill>, DirectoryError>;

    /// A single bill by canonical id.
    async fn bill_by_id(&self, bill_id: &str) -> Result<Option<Bill>, DirectoryError>;

    /// Subscribes the phone number to SMS updates about a bill. Returns
    /// `false` when the subscription service declines the request.
    async fn subscribe_to_bill_updates(
        &self,
        phone: &str,
        bill_id: &str,
    ) -> Result<bool, DirectoryError>;

    /// Election administration offices covering the zip code.
    async fn election_offices_for_zip(
        &self,
        zipcode: &str,
    ) -> Result<Vec<ElectionOffice>, DirectoryError>;
}

/// Persistence for caller-initiated messages: SMS signups and recorded
/// feedback. Implemented over the store's inbox tables by the server.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Queues a phone number for SMS updates.
    async fn record_signup(&self, phone: &str) -> Result<(), StoreError>;

    /// Files a recorded feedback message by its recording URL.
    async fn record_message(&self, call_sid: &str, recording_url: &str) -> Result<(), StoreError>;
}
