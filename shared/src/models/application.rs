use serde::{Deserialize, Serialize};

/// Applicant identity details for a government-service application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicantDetails {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Reference to an uploaded supporting document
///
/// Upload handling itself is an external collaborator; only the reference
/// travels with the application record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRef {
    /// Document kind, e.g. "aadhaar_card", "photo"
    pub name: String,
    pub url: String,
}

/// Domain payload of an application workflow record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationPayload {
    /// Requested service, e.g. "pan_card", "voter_id"
    pub service_name: String,
    pub applicant: ApplicantDetails,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}
