use crate::{
    error::{DomainError, Result, TimeLimitExceeded},
    filter::Filter,
    types::{AttributeMap, DirectoryEntry},
};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Point in time after which a search gives up. `Deadline::default()` never expires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn after(duration: Duration) -> Self {
        Self(Instant::now().checked_add(duration))
    }

    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// The static, ordered list of entries served by the responder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    /// Validates and loads raw attribute maps, keeping their order.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = AttributeMap>,
    {
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                DirectoryEntry::new(record).map_err(|e| match e {
                    DomainError::MalformedEntry(reason) => {
                        DomainError::MalformedEntry(format!("entry #{index}: {reason}"))
                    }
                    e => e,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_first_match(
        &self,
        filter: &Filter,
        deadline: Deadline,
    ) -> std::result::Result<Option<&DirectoryEntry>, TimeLimitExceeded> {
        find_first_match(filter, &self.entries, deadline)
    }
}

/// Returns the earliest entry matching `filter`, stopping at the first match.
///
/// The deadline is checked before each entry; once it has passed the scan is abandoned.
#[instrument(skip_all, level = "debug", fields(%filter))]
pub fn find_first_match<'a>(
    filter: &Filter,
    entries: &'a [DirectoryEntry],
    deadline: Deadline,
) -> std::result::Result<Option<&'a DirectoryEntry>, TimeLimitExceeded> {
    for (index, entry) in entries.iter().enumerate() {
        if deadline.is_expired() {
            debug!(index, "Deadline reached, aborting the scan");
            return Err(TimeLimitExceeded);
        }
        if filter.matches(entry) {
            debug!(index, mail = entry.mail(), "Found a match");
            return Ok(Some(entry));
        }
    }
    debug!("No match");
    Ok(None)
}
