//! Contact form intake.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::limits::{truncate_chars, MAX_IP_LEN};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Replied,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Replied => "replied",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "new" => Ok(Self::New),
            "read" => Ok(Self::Read),
            "replied" => Ok(Self::Replied),
            other => Err(Error::internal(format!("unknown contact status '{}'", other))),
        }
    }
}

/// Body of `POST /api/contact/submit`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ContactSubmission {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(
        min = 10,
        max = 2000,
        message = "Message must be between 10 and 2000 characters"
    ))]
    pub message: String,
}

impl ContactSubmission {
    /// Trims and validates, producing the message to store.
    pub fn into_message(self, ip_address: &str) -> Result<ContactMessage> {
        let submission = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            message: self.message.trim().to_string(),
        };
        submission.validate()?;

        Ok(ContactMessage {
            id: Uuid::new_v4(),
            name: submission.name,
            email: submission.email,
            message: submission.message,
            status: ContactStatus::New,
            ip_address: truncate_chars(ip_address, MAX_IP_LEN),
            created_at: Utc::now(),
        })
    }
}

/// A stored contact message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: ContactStatus,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}
