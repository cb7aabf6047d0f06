//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod event;
mod external_log;
mod person;
mod site;
mod whitelist;

pub use event::{Event, EventId};
pub use external_log::ExternalAccessLogEntry;
pub use person::{GuestType, Person, PersonId, PersonType};
pub use site::{AccessPoint, AccessPointId, SiteId};
pub use whitelist::{
    Recurrence, TimeWindow, WhitelistEntry, WhitelistEntryId, WhitelistEntryInput,
};
