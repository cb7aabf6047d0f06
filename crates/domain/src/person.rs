use std::fmt::{Display, Formatter};
use std::str::FromStr;

use gatewarden_core::{AppError, AppResult, FieldErrors, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Person identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(Uuid);

impl PersonId {
    /// Creates a random person identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a person identifier from an existing UUID value.
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

impl Default for PersonId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PersonId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Person categories recognized by the authorization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonType {
    /// Club member.
    Member,
    /// Staff employee.
    Employee,
    /// External provider.
    Provider,
    /// Invited guest, always paired with a [`GuestType`].
    Guest,
}

impl PersonType {
    /// Returns a stable storage value for this person type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Employee => "employee",
            Self::Provider => "provider",
            Self::Guest => "guest",
        }
    }
}

impl FromStr for PersonType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "member" => Ok(Self::Member),
            "employee" => Ok(Self::Employee),
            "provider" => Ok(Self::Provider),
            "guest" => Ok(Self::Guest),
            _ => Err(AppError::Validation(format!(
                "unknown person type '{value}'"
            ))),
        }
    }
}

/// Guest subcategories used by event allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestType {
    /// Guest accompanying a member.
    MemberGuest,
    /// Visitor invited to a specific event.
    EventVisitor,
}

impl GuestType {
    /// Returns a stable storage value for this guest type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemberGuest => "member_guest",
            Self::EventVisitor => "event_visitor",
        }
    }
}

impl FromStr for GuestType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "member_guest" => Ok(Self::MemberGuest),
            "event_visitor" => Ok(Self::EventVisitor),
            _ => Err(AppError::Validation(format!("unknown guest type '{value}'"))),
        }
    }
}

/// A registered person able to appear on whitelists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    id: PersonId,
    first_name: NonEmptyString,
    last_name: NonEmptyString,
    document_number: NonEmptyString,
    person_type: PersonType,
    guest_type: Option<GuestType>,
    is_active: bool,
}

impl Person {
    /// Creates a validated person.
    ///
    /// Guests carry a guest type; every other category forbids one.
    pub fn new(
        id: PersonId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        document_number: impl Into<String>,
        person_type: PersonType,
        guest_type: Option<GuestType>,
        is_active: bool,
    ) -> AppResult<Self> {
        let mut errors = FieldErrors::new();
        match (person_type, guest_type) {
            (PersonType::Guest, None) => {
                errors.push("guest_type", "guest persons require a guest type");
            }
            (person_type, Some(_)) if person_type != PersonType::Guest => {
                errors.push("guest_type", "only guest persons may carry a guest type");
            }
            _ => {}
        }
        errors.into_result()?;

        Ok(Self {
            id,
            first_name: NonEmptyString::new(first_name)?,
            last_name: NonEmptyString::new(last_name)?,
            document_number: NonEmptyString::new(document_number)?,
            person_type,
            guest_type,
            is_active,
        })
    }

    /// Returns the person identifier.
    #[must_use]
    pub fn id(&self) -> PersonId {
        self.id
    }

    /// Returns the first name.
    #[must_use]
    pub fn first_name(&self) -> &NonEmptyString {
        &self.first_name
    }

    /// Returns the last name.
    #[must_use]
    pub fn last_name(&self) -> &NonEmptyString {
        &self.last_name
    }

    /// Returns the identity document number.
    #[must_use]
    pub fn document_number(&self) -> &NonEmptyString {
        &self.document_number
    }

    /// Returns the person category.
    #[must_use]
    pub fn person_type(&self) -> PersonType {
        self.person_type
    }

    /// Returns the guest subcategory when the person is a guest.
    #[must_use]
    pub fn guest_type(&self) -> Option<GuestType> {
        self.guest_type
    }

    /// Returns whether the person is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}
