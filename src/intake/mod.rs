//! Client-side file intake
//!
//! Keeps one authoritative "selected file" slot fed by the file picker, drag and
//! drop, and an explicit remove, and admits only MP4 files into it.
//!
//! # Example
//!
//! ```
//! use clipdrop::intake::{CandidateFile, IntakeController, INVALID_FILE_MESSAGE};
//!
//! let mut controller = IntakeController::default();
//!
//! controller.select_from_picker(vec![CandidateFile::new("doc.pdf", 10, "application/pdf")]);
//! assert_eq!(controller.validation_error(), Some(INVALID_FILE_MESSAGE));
//!
//! controller.select_from_drop(vec![CandidateFile::new("clip.MP4", 10, "")]);
//! assert_eq!(controller.current_file().unwrap().name(), "clip.MP4");
//! assert!(controller.is_ready());
//! ```

pub mod client;
pub mod controller;
pub mod state;

pub use client::{ClientError, UploadUrlClient, UploadUrlSource};
pub use controller::{FileInput, HeadlessFileInput, IntakeController, IssueTicket, UiEvent};
pub use state::{
    select_candidate, CandidateFile, InputSource, IntakeAction, IntakePhase, IntakeState,
    RequestId, RequestLifecycle, INVALID_FILE_MESSAGE, MP4_EXTENSION,
};
