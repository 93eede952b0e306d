//! Intake controller
//!
//! Binds UI events (picker change, drag and drop, remove click, analyze click)
//! to reducer actions and performs the side effects the reducer cannot: clearing
//! the picker input, containing events, and calling the upload URL service.

use super::client::UploadUrlSource;
use super::state::{
    CandidateFile, InputSource, IntakeAction, IntakeState, RequestId, RequestLifecycle,
};
use tracing::{debug, info, warn};

/// Message recorded when the upload URL request fails.
pub const ISSUANCE_FAILED_MESSAGE: &str = "Failed to generate upload URL";

/// A UI event that can be contained by the handler receiving it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UiEvent {
    default_prevented: bool,
    propagation_stopped: bool,
}

impl UiEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    fn contain(&mut self) {
        self.prevent_default();
        self.stop_propagation();
    }
}

/// The hidden file input behind the dropzone.
pub trait FileInput {
    /// MIME filter advertised to the OS dialog. Advisory only.
    fn accept(&self) -> &str {
        crate::MP4_MIME_TYPE
    }

    /// Open the browse dialog.
    fn open(&mut self);

    /// Reset the input's value so choosing the same path again still raises a
    /// change notification.
    fn clear(&mut self);
}

/// In-memory file input for headless hosts and tests.
#[derive(Debug, Default, Clone)]
pub struct HeadlessFileInput {
    /// Path shown by the input, set by [`pick`](HeadlessFileInput::pick).
    pub value: Option<String>,
    pub open_count: usize,
    pub clear_count: usize,
}

impl HeadlessFileInput {
    /// Stand-in for the OS dialog: the input takes the first file's name as its
    /// value and hands the files on for [`IntakeController::select_from_picker`].
    pub fn pick(&mut self, files: Vec<CandidateFile>) -> Vec<CandidateFile> {
        self.value = files.first().map(|f| f.name().to_string());
        files
    }
}

impl FileInput for HeadlessFileInput {
    fn open(&mut self) {
        self.open_count += 1;
    }

    fn clear(&mut self) {
        self.value = None;
        self.clear_count += 1;
    }
}

/// One upload URL request handed out by [`IntakeController::analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueTicket {
    pub request: RequestId,
    pub object_name: String,
}

/// Owns the intake state for one dropzone.
pub struct IntakeController<I: FileInput> {
    state: IntakeState,
    input: I,
    next_request: RequestId,
}

impl<I: FileInput> IntakeController<I> {
    pub fn new(input: I) -> Self {
        Self {
            state: IntakeState::new(),
            input,
            next_request: 1,
        }
    }

    pub fn state(&self) -> &IntakeState {
        &self.state
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn current_file(&self) -> Option<&CandidateFile> {
        self.state.current_file.as_ref()
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.state.validation_error.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn request(&self) -> &RequestLifecycle {
        &self.state.request
    }

    fn dispatch(&mut self, action: IntakeAction) {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(action);
    }

    /// Click on the dropzone forwards to the hidden input.
    pub fn browse(&mut self) {
        self.input.open();
    }

    /// Picker change notification.
    pub fn select_from_picker(&mut self, files: Vec<CandidateFile>) {
        self.select(InputSource::Picker, files);
        self.input.clear();
    }

    /// Files taken from a drop payload. Ends dragging.
    pub fn select_from_drop(&mut self, files: Vec<CandidateFile>) {
        self.select(InputSource::Drop, files);
    }

    fn select(&mut self, source: InputSource, files: Vec<CandidateFile>) {
        debug!(?source, count = files.len(), "Selection");
        self.dispatch(IntakeAction::Select { source, files });
    }

    pub fn set_dragging(&mut self, active: bool) {
        self.dispatch(IntakeAction::SetDragging(active));
    }

    pub fn on_drag_over(&mut self, event: &mut UiEvent) {
        event.contain();
        self.set_dragging(true);
    }

    pub fn on_drag_leave(&mut self, event: &mut UiEvent) {
        event.contain();
        self.set_dragging(false);
    }

    pub fn on_drop(&mut self, event: &mut UiEvent, files: Vec<CandidateFile>) {
        event.contain();
        self.select_from_drop(files);
    }

    /// Clear the selection. The triggering click must not reach the dropzone,
    /// which would reopen the picker.
    pub fn remove(&mut self, event: Option<&mut UiEvent>) {
        if let Some(event) = event {
            event.stop_propagation();
        }
        self.dispatch(IntakeAction::Remove);
    }

    /// Start an upload URL request for the held file.
    ///
    /// Returns `None` without touching state when no file is held or a request
    /// is already in flight.
    pub fn analyze(&mut self) -> Option<IssueTicket> {
        let name = self.state.current_file.as_ref()?.name().to_string();

        if self.state.is_issuing() {
            debug!(file = %name, "Upload URL request already in flight");
            return None;
        }

        info!(file = %name, "Analyzing {}", name);

        let request = self.next_request;
        self.next_request += 1;
        self.dispatch(IntakeAction::IssuanceStarted(request));

        Some(IssueTicket {
            request,
            object_name: name,
        })
    }

    /// Record the outcome of a ticket's request. Outcomes for superseded
    /// tickets are dropped.
    pub fn complete_issuance(&mut self, request: RequestId, outcome: Result<String, String>) {
        let action = match outcome {
            Ok(url) => IntakeAction::IssuanceSucceeded { request, url },
            Err(message) => IntakeAction::IssuanceFailed { request, message },
        };
        self.dispatch(action);
    }

    /// `analyze` followed by the request itself.
    pub async fn analyze_with<S>(&mut self, source: &S) -> Option<&RequestLifecycle>
    where
        S: UploadUrlSource + ?Sized,
    {
        let ticket = self.analyze()?;

        let outcome = match source.request_upload_url(&ticket.object_name).await {
            Ok(url) => Ok(url),
            Err(e) => {
                warn!(file = %ticket.object_name, error = %e, "Upload URL request failed");
                Err(ISSUANCE_FAILED_MESSAGE.to_string())
            }
        };

        self.complete_issuance(ticket.request, outcome);
        Some(&self.state.request)
    }
}

impl Default for IntakeController<HeadlessFileInput> {
    fn default() -> Self {
        Self::new(HeadlessFileInput::default())
    }
}
