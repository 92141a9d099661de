//! Customer accounts and login records.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Partition key shared by every customer profile.
pub const CUSTOMER_PARTITION: &str = "Customer";

/// A registered customer, keyed by email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerProfile {
    /// Table partition, always [`CUSTOMER_PARTITION`] for customers.
    pub partition_key: String,
    /// Row key within the partition, the email address.
    pub row_key: String,
    /// Email address used to log in.
    pub email: String,
    /// One-way hash of the password in PHC string format.
    pub password_hash: String,
    /// Time of the last write, set by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl CustomerProfile {
    /// Creates a profile in the customer partition.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            partition_key: CUSTOMER_PARTITION.to_owned(),
            row_key: email.clone(),
            email,
            password_hash: password_hash.into(),
            timestamp: None,
        }
    }

    /// Returns a copy stamped with the given write time.
    #[must_use]
    pub fn stamped(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A successful login, as written to the login report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    /// Email address that logged in.
    pub email: String,
    /// Time of the login.
    pub at: Timestamp,
}

impl LoginRecord {
    /// Records a login happening now.
    pub fn now(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            at: Timestamp::now(),
        }
    }

    /// Line appended to the shared login report.
    pub fn report_line(&self) -> String {
        format!(
            "{}: {} logged in\n",
            self.at.strftime("%Y-%m-%d %H:%M:%S UTC"),
            self.email
        )
    }

    /// Name of the per-login note file, e.g. `Log_20240131_081500_ann_at_example_dot_com.txt`.
    pub fn note_file_name(&self) -> String {
        let sanitized = self.email.replace('@', "_at_").replace('.', "_dot_");
        format!("Log_{}_{}.txt", self.at.strftime("%Y%m%d_%H%M%S"), sanitized)
    }

    /// Body of the per-login note file.
    pub fn note_body(&self) -> String {
        format!("User {} logged in", self.email)
    }
}
