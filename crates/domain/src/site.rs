use std::fmt::{Display, Formatter};

use gatewarden_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Site identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(Uuid);

impl SiteId {
    /// Creates a random site identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a site identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SiteId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SiteId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Access point identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessPointId(Uuid);

impl AccessPointId {
    /// Creates a random access point identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an access point identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccessPointId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AccessPointId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A gate, turnstile cluster or door controlled by the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPoint {
    id: AccessPointId,
    site_id: SiteId,
    name: NonEmptyString,
    description: Option<String>,
}

impl AccessPoint {
    /// Creates a validated access point.
    pub fn new(
        id: AccessPointId,
        site_id: SiteId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            site_id,
            name: NonEmptyString::new(name)?,
            description,
        })
    }

    /// Returns the access point identifier.
    #[must_use]
    pub fn id(&self) -> AccessPointId {
        self.id
    }

    /// Returns the owning site identifier.
    #[must_use]
    pub fn site_id(&self) -> SiteId {
        self.site_id
    }

    /// Returns the access point name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessPoint, AccessPointId, SiteId};

    #[test]
    fn access_point_rejects_blank_name() {
        assert!(AccessPoint::new(AccessPointId::new(), SiteId::new(), "  ", None).is_err());
    }

    #[test]
    fn access_point_keeps_site_reference() {
        let site_id = SiteId::new();
        let access_point = AccessPoint::new(AccessPointId::new(), site_id, "North gate", None);
        assert!(access_point.is_ok());
        let access_point = access_point.unwrap_or_else(|_| unreachable!());
        assert_eq!(access_point.site_id(), site_id);
    }
}
