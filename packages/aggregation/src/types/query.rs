//! The identity query a run starts from.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{AggregationError, Result};

/// One populated input slot of a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryField {
    Name,
    Location,
    Email,
    Phone,
    Username,
    Address,
    Image,
}

impl QueryField {
    /// Every field, in fingerprint order.
    pub const ALL: [QueryField; 7] = [
        QueryField::Name,
        QueryField::Location,
        QueryField::Email,
        QueryField::Phone,
        QueryField::Username,
        QueryField::Address,
        QueryField::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryField::Name => "name",
            QueryField::Location => "location",
            QueryField::Email => "email",
            QueryField::Phone => "phone",
            QueryField::Username => "username",
            QueryField::Address => "address",
            QueryField::Image => "image",
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial identity query.
///
/// Every field is optional, but a run needs at least one of them. The query
/// is shared read-only by all adapter tasks of a run; blank strings count
/// as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Image reference (URL or upload handle) for face-match sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Query {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Value of a field, if populated with something other than whitespace.
    pub fn get(&self, field: QueryField) -> Option<&str> {
        let raw = match field {
            QueryField::Name => &self.name,
            QueryField::Location => &self.location,
            QueryField::Email => &self.email,
            QueryField::Phone => &self.phone,
            QueryField::Username => &self.username,
            QueryField::Address => &self.address,
            QueryField::Image => &self.image,
        };
        raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Check whether a field is populated.
    pub fn has(&self, field: QueryField) -> bool {
        self.get(field).is_some()
    }

    /// Populated fields, in a fixed order.
    pub fn fields(&self) -> Vec<QueryField> {
        QueryField::ALL
            .into_iter()
            .filter(|f| self.has(*f))
            .collect()
    }

    /// Check if no field is populated.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Reject a query with no populated fields.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(AggregationError::InvalidQuery {
                reason: "at least one of name, location, email, phone, username, address or image is required"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Normalized, order-independent identity of this query.
    ///
    /// Values are trimmed, whitespace-collapsed and lowercased before
    /// hashing, so `"Jane  Doe"` and `"jane doe"` share a fingerprint. The
    /// raw values never appear in logs; this does.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in self.fields() {
            if let Some(value) = self.get(field) {
                let normalized = value
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                hasher.update(field.as_str().as_bytes());
                hasher.update(b"=");
                hasher.update(normalized.as_bytes());
                hasher.update(b"\n");
            }
        }
        hex::encode(&hasher.finalize()[..8])
    }
}
