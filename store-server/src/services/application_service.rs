//! Jan Seva application orchestration
//!
//! Applications carry no stock or pricing; intake is mint → create. All
//! later movement (review, approval, completion, cancellation) goes
//! through the workflow engine.

use super::events::{EVENT_CHANNEL_CAPACITY, StatusChanged};
use crate::sequence::{MintError, SequenceMinter};
use crate::storage::{APPLICATIONS_TABLE, CoreStorage};
use crate::workflow::{WorkflowEngine, WorkflowError, WorkflowRecord};
use shared::models::{ApplicantDetails, ApplicationPayload, DocumentRef};
use shared::status::ApplicationStatus;
use thiserror::Error;
use tokio::sync::broadcast;

/// Identifier prefix for application numbers (public format contract)
pub const APPLICATION_PREFIX: &str = "JS";

/// Application intake request
#[derive(Debug, Clone)]
pub struct ApplicationRequest {
    /// Requested service, e.g. "pan_card"
    pub service_name: String,
    pub applicant: ApplicantDetails,
    pub documents: Vec<DocumentRef>,
}

/// Application service errors
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Mint(#[from] MintError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Orchestrates application intake and lifecycle
#[derive(Debug, Clone)]
pub struct ApplicationService {
    minter: SequenceMinter,
    applications: WorkflowEngine<ApplicationStatus, ApplicationPayload>,
    event_tx: broadcast::Sender<StatusChanged>,
}

impl ApplicationService {
    pub fn new(storage: CoreStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            minter: SequenceMinter::new(storage.clone()),
            applications: WorkflowEngine::new(storage, APPLICATIONS_TABLE),
            event_tx,
        }
    }

    /// Subscribe to status-change broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChanged> {
        self.event_tx.subscribe()
    }

    /// Register a new application in the `pending` state
    pub fn submit(
        &self,
        request: ApplicationRequest,
    ) -> ApplicationResult<WorkflowRecord<ApplicationStatus, ApplicationPayload>> {
        let application_no = self
            .minter
            .mint(APPLICATION_PREFIX, chrono::Utc::now().date_naive())?;

        let record = self.applications.create(
            &application_no,
            ApplicationPayload {
                service_name: request.service_name,
                applicant: request.applicant,
                documents: request.documents,
            },
        )?;

        self.emit(&record, None, None);
        tracing::info!(application_no = %application_no, service = %record.payload.service_name, "Application submitted");
        Ok(record)
    }

    /// Officer-driven status change
    pub fn update_status(
        &self,
        application_no: &str,
        expected_version: u64,
        next: ApplicationStatus,
        note: Option<String>,
        actor: Option<String>,
    ) -> ApplicationResult<WorkflowRecord<ApplicationStatus, ApplicationPayload>> {
        let updated = self.applications.transition(
            application_no,
            expected_version,
            next,
            note.clone(),
            actor.clone(),
        )?;
        self.emit(&updated, note, actor);
        Ok(updated)
    }

    /// Cancel a pending or in-review application
    pub fn cancel(
        &self,
        application_no: &str,
        note: Option<String>,
        actor: Option<String>,
    ) -> ApplicationResult<WorkflowRecord<ApplicationStatus, ApplicationPayload>> {
        let record = self
            .applications
            .get(application_no)?
            .ok_or_else(|| WorkflowError::NotFound(application_no.to_string()))?;
        let updated = self.applications.transition(
            application_no,
            record.version,
            ApplicationStatus::Cancelled,
            note.clone(),
            actor.clone(),
        )?;
        self.emit(&updated, note, actor);
        Ok(updated)
    }

    /// Load an application by number
    pub fn get(
        &self,
        application_no: &str,
    ) -> ApplicationResult<Option<WorkflowRecord<ApplicationStatus, ApplicationPayload>>> {
        Ok(self.applications.get(application_no)?)
    }

    /// All applications (back-office listing)
    pub fn list(
        &self,
    ) -> ApplicationResult<Vec<WorkflowRecord<ApplicationStatus, ApplicationPayload>>> {
        Ok(self.applications.list()?)
    }

    fn emit(
        &self,
        record: &WorkflowRecord<ApplicationStatus, ApplicationPayload>,
        note: Option<String>,
        actor: Option<String>,
    ) {
        let _ = self.event_tx.send(StatusChanged::new(
            &record.id,
            record.status.to_string(),
            note,
            actor,
        ));
    }
}
