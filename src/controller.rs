//! Workflow controller: the single owner of upload state.
//!
//! ## State machine
//!
//! ```text
//!            start_upload(file)
//!   Idle ─────────────────────────▶ Uploading
//!    ▲                               │      │
//!    │ reset()              Ok(result)      Err(e)
//!    │                               ▼      ▼
//!    └──────────────────── Success(r)    Failure(msg)
//! ```
//!
//! [`WorkflowController`] is a plain reducer: it consumes [`WorkflowEvent`]s
//! and answers with an optional [`Command`] for the caller to execute. It
//! never performs I/O itself, which keeps every transition synchronous and
//! testable.
//!
//! Each upload gets a fresh [`RequestId`]. A completion is applied only if
//! its id matches the request currently in flight; anything else is a stale
//! response (e.g. one that arrives after `reset()`) and is dropped.
//!
//! [`UploadSession`] is the async driver: it executes `Submit` commands on
//! tokio through an [`Extractor`] and feeds completions back via a channel.

use crate::client::Extractor;
use crate::error::ExtractError;
use crate::model::{ExtractionResult, StagedFile};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Identifies one submitted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Human-readable failure text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage(String);

impl ErrorMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ExtractError> for ErrorMessage {
    fn from(e: &ExtractError) -> Self {
        ErrorMessage(e.user_message())
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current phase of the workflow, with its data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Uploading,
    Success(ExtractionResult),
    Failure(ErrorMessage),
}

impl WorkflowState {
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkflowState::Idle)
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, WorkflowState::Uploading)
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            WorkflowState::Success(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorMessage> {
        match self {
            WorkflowState::Failure(m) => Some(m),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "Idle",
            WorkflowState::Uploading => "Uploading",
            WorkflowState::Success(_) => "Success",
            WorkflowState::Failure(_) => "Failure",
        }
    }
}

/// Inputs to the controller.
#[derive(Debug)]
pub enum WorkflowEvent {
    StartUpload(StagedFile),
    Completed {
        request: RequestId,
        outcome: Result<ExtractionResult, ExtractError>,
    },
    Reset,
}

/// Work the caller must perform on the controller's behalf.
#[derive(Debug)]
pub enum Command {
    /// Call the extractor with `file`, then report back as
    /// [`WorkflowEvent::Completed`] carrying the same `request`.
    Submit { request: RequestId, file: StagedFile },
}

/// The state-machine reducer.
#[derive(Debug, Default)]
pub struct WorkflowController {
    state: WorkflowState,
    /// `Some` exactly while `state` is `Uploading`.
    in_flight: Option<RequestId>,
    next_request: u64,
}

impl WorkflowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    /// Dispatch an event.
    pub fn handle(&mut self, event: WorkflowEvent) -> Option<Command> {
        match event {
            WorkflowEvent::StartUpload(file) => self.start_upload(file),
            WorkflowEvent::Completed { request, outcome } => {
                self.complete(request, outcome);
                None
            }
            WorkflowEvent::Reset => {
                self.reset();
                None
            }
        }
    }

    /// `Idle → Uploading`. Ignored in every other state.
    pub fn start_upload(&mut self, file: StagedFile) -> Option<Command> {
        if !self.state.is_idle() {
            warn!(
                state = self.state.name(),
                name = file.name(),
                "upload ignored: controller is not idle"
            );
            return None;
        }

        self.next_request += 1;
        let request = RequestId(self.next_request);
        self.state = WorkflowState::Uploading;
        self.in_flight = Some(request);
        info!(?request, name = file.name(), "upload started");
        Some(Command::Submit { request, file })
    }

    /// `Uploading → Success | Failure` for the current request.
    ///
    /// Returns `false` (and changes nothing) for a stale completion.
    pub fn complete(
        &mut self,
        request: RequestId,
        outcome: Result<ExtractionResult, ExtractError>,
    ) -> bool {
        if self.in_flight != Some(request) {
            debug!(?request, current = ?self.in_flight, "discarding stale completion");
            return false;
        }

        self.in_flight = None;
        self.state = match outcome {
            Ok(result) => {
                info!(?request, "upload succeeded");
                WorkflowState::Success(result)
            }
            Err(e) => {
                let message = ErrorMessage::from(&e);
                warn!(?request, "upload failed: {message}");
                WorkflowState::Failure(message)
            }
        };
        true
    }

    /// Back to `Idle`, discarding any result or error.
    ///
    /// From `Uploading` the in-flight request is forgotten, so its eventual
    /// completion is treated as stale.
    pub fn reset(&mut self) {
        if let Some(request) = self.in_flight.take() {
            debug!(?request, "reset while uploading; request abandoned");
        }
        self.state = WorkflowState::Idle;
    }
}

// ── Async driver ─────────────────────────────────────────────────────────

struct Completion {
    request: RequestId,
    outcome: Result<ExtractionResult, ExtractError>,
}

/// Runs a [`WorkflowController`] against an [`Extractor`] on tokio.
///
/// # Example
/// ```rust,no_run
/// use allergen_extract::{ClientConfig, HttpExtractionClient, UploadSession};
/// use allergen_extract::selector::{validate, Candidate};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpExtractionClient::new(ClientConfig::from_env()?)?;
/// let mut session = UploadSession::new(Arc::new(client));
///
/// let candidate = Candidate::from_path("label.pdf").await?;
/// if let Some(state) = session.upload(validate(candidate)?).await {
///     println!("{state:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct UploadSession {
    controller: WorkflowController,
    extractor: Arc<dyn Extractor>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    task: Option<JoinHandle<()>>,
}

impl UploadSession {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller: WorkflowController::new(),
            extractor,
            tx,
            rx,
            task: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        self.controller.state()
    }

    /// Start an upload in the background. Returns `false` if the controller
    /// refused it (not idle).
    pub fn start_upload(&mut self, file: StagedFile) -> bool {
        let Some(Command::Submit { request, file }) = self.controller.start_upload(file) else {
            return false;
        };

        let submit = self.extractor.submit(file);
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let outcome = submit.await;
            // The receiver lives as long as the session.
            let _ = tx.send(Completion { request, outcome });
        }));
        true
    }

    /// Wait until the current upload settles and return the new state.
    ///
    /// Returns immediately when nothing is in flight. Stale completions
    /// received on the way are discarded.
    pub async fn next_completion(&mut self) -> &WorkflowState {
        while self.controller.in_flight().is_some() {
            let Some(Completion { request, outcome }) = self.rx.recv().await else {
                break;
            };
            if self.controller.complete(request, outcome) {
                self.task = None;
            }
        }
        self.controller.state()
    }

    /// Start an upload and wait for its outcome.
    ///
    /// `None` when the upload was refused because the session is not idle;
    /// the current state is left untouched.
    pub async fn upload(&mut self, file: StagedFile) -> Option<&WorkflowState> {
        if !self.start_upload(file) {
            debug!(state = self.state().name(), "upload refused");
            return None;
        }
        Some(self.next_completion().await)
    }

    /// Abort any in-flight request and return to `Idle`.
    pub fn reset(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.controller.reset();
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
