//! Join requests and invitations: `pending` until the counterparty accepts or
//! rejects, then frozen.
//!
//! Capacity is not checked when a request is created, so an owner can
//! collect more applicants than slots and pick among them. It is checked when a
//! request is accepted, against the count at that moment, and the write itself is
//! conditional on the count so two concurrent acceptances cannot both take the last
//! slot. A requester cannot withdraw a pending request.

mod create;
mod respond;
mod review;

pub use review::{Applicant, Dashboard, OwnRequest};

use time::OffsetDateTime;

use crate::{db::Posting, AppError, AppResult};

/// Whether the posting still takes new requests.
fn ensure_accepting(posting: &Posting) -> AppResult<()> {
    if !posting.is_open() {
        return Err(AppError::invalid_state("posting is closed"));
    }
    if posting.deadline_passed(OffsetDateTime::now_utc()) {
        return Err(AppError::invalid_state("application deadline has passed"));
    }
    Ok(())
}

/// Blank messages from forms are stored as no message.
fn clean_message(message: Option<String>) -> Option<String> {
    message
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty())
}
