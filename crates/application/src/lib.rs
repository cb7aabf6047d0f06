//! Application services and ports.

#![forbid(unsafe_code)]

mod batch_service;
#[cfg(test)]
mod test_support;
mod directory_ports;
mod external_log_ports;
mod external_log_service;
mod whitelist_ports;
mod whitelist_service;

pub use batch_service::{
    BatchAuthorizationInput, BatchAuthorizationOutcome, BatchAuthorizationService,
};
pub use directory_ports::{AccessPointRepository, EventRepository, PersonQuery, PersonRepository};
pub use external_log_ports::{
    ExternalAccessLogRepository, ExternalAccessLogSource, RawAccessMovement,
};
pub use external_log_service::{ExternalAccessLogQueryService, ExternalAccessLogSyncService};
pub use whitelist_ports::{WhitelistEntryQuery, WhitelistRepository};
pub use whitelist_service::WhitelistService;
