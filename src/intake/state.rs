//! Intake state and its reducer
//!
//! All transitions are pure: `IntakeState::reduce` takes the previous state and
//! an action and returns the next state, so the whole selection flow can be
//! exercised without any UI host.

use crate::MP4_MIME_TYPE;

/// Message shown when a non-empty selection contains no MP4 file.
pub const INVALID_FILE_MESSAGE: &str = "Please upload an MP4 video file.";

/// Extension accepted when the reported MIME type is missing or wrong.
pub const MP4_EXTENSION: &str = ".mp4";

/// A file offered by the user before validation decides whether to keep it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    name: String,
    size_bytes: u64,
    mime_type: String,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// MIME type reported exactly as `video/mp4`.
    pub fn has_mp4_mime_type(&self) -> bool {
        self.mime_type == MP4_MIME_TYPE
    }

    /// Name ends in `.mp4`, ignoring case.
    pub fn has_mp4_extension(&self) -> bool {
        self.name.to_lowercase().ends_with(MP4_EXTENSION)
    }

    /// Either check passes. Browsers and operating systems report the MIME
    /// type of MP4 files inconsistently, hence the extension fallback.
    pub fn is_mp4(&self) -> bool {
        self.has_mp4_mime_type() || self.has_mp4_extension()
    }

    /// Size in mebibytes with two decimals, e.g. `12.34 MB`.
    pub fn display_size(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Pick the file a selection should keep: the earliest element that is an
/// MP4 by MIME type or by extension.
pub fn select_candidate(files: &[CandidateFile]) -> Option<&CandidateFile> {
    files.iter().find(|f| f.is_mp4())
}

/// Where a selection came from. A drop also ends dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Picker,
    Drop,
}

/// Identifies one upload URL request so late responses can be discarded.
pub type RequestId = u64;

/// Progress of the upload URL request made by `analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestLifecycle {
    #[default]
    Idle,
    Issuing(RequestId),
    Issued(String),
    Failed(String),
}

/// Coarse view of the selection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakePhase<'a> {
    Empty,
    Holding(&'a CandidateFile),
    Rejected(&'a str),
}

/// Discrete events the reducer understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeAction {
    Select {
        source: InputSource,
        files: Vec<CandidateFile>,
    },
    SetDragging(bool),
    Remove,
    IssuanceStarted(RequestId),
    IssuanceSucceeded { request: RequestId, url: String },
    IssuanceFailed { request: RequestId, message: String },
}

/// Complete intake state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntakeState {
    pub current_file: Option<CandidateFile>,
    pub is_dragging: bool,
    pub validation_error: Option<String>,
    pub request: RequestLifecycle,
}

impl IntakeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action.
    pub fn reduce(self, action: IntakeAction) -> Self {
        match action {
            IntakeAction::Select { source, files } => {
                let state = match source {
                    InputSource::Drop => Self {
                        is_dragging: false,
                        ..self
                    },
                    InputSource::Picker => self,
                };
                state.select(&files)
            }
            IntakeAction::SetDragging(active) => Self {
                is_dragging: active,
                ..self
            },
            IntakeAction::Remove => Self {
                current_file: None,
                validation_error: None,
                request: RequestLifecycle::Idle,
                ..self
            },
            IntakeAction::IssuanceStarted(request) => Self {
                request: RequestLifecycle::Issuing(request),
                ..self
            },
            IntakeAction::IssuanceSucceeded { request, url } => {
                self.settle(request, RequestLifecycle::Issued(url))
            }
            IntakeAction::IssuanceFailed { request, message } => {
                self.settle(request, RequestLifecycle::Failed(message))
            }
        }
    }

    fn select(self, files: &[CandidateFile]) -> Self {
        // Cancelled dialog or empty drop
        if files.is_empty() {
            return self;
        }

        match select_candidate(files) {
            Some(file) => Self {
                current_file: Some(file.clone()),
                validation_error: None,
                request: RequestLifecycle::Idle,
                ..self
            },
            None => Self {
                current_file: None,
                validation_error: Some(INVALID_FILE_MESSAGE.to_string()),
                request: RequestLifecycle::Idle,
                ..self
            },
        }
    }

    fn settle(self, request: RequestId, outcome: RequestLifecycle) -> Self {
        if self.request != RequestLifecycle::Issuing(request) {
            return self;
        }
        Self {
            request: outcome,
            ..self
        }
    }

    pub fn phase(&self) -> IntakePhase<'_> {
        match (&self.current_file, &self.validation_error) {
            (Some(file), _) => IntakePhase::Holding(file),
            (None, Some(message)) => IntakePhase::Rejected(message),
            (None, None) => IntakePhase::Empty,
        }
    }

    /// Analyze is enabled only while a file is held.
    pub fn is_ready(&self) -> bool {
        self.current_file.is_some()
    }

    pub fn is_issuing(&self) -> bool {
        matches!(self.request, RequestLifecycle::Issuing(_))
    }
}
