#![warn(missing_docs)]
//! Retouch - session core for AI-powered image editing.
//!
//! This crate owns the round trip between an image-edit UI and the Gemini
//! `generateContent` API: encoding the selected image for transport, invoking
//! the remote model with a natural-language instruction, interpreting the
//! heterogeneous response, and reconciling session state when the outcome
//! lands. Rendering, drag-and-drop, and download links stay outside; they
//! feed raw bytes and text in, and draw from [`SessionView`] snapshots.
//!
//! # Quick Start
//!
//! ```no_run
//! use retouch::{EditSession, GeminiEditor, InputImage, PreviewHandle};
//!
//! #[tokio::main]
//! async fn main() -> retouch::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let mut session = EditSession::new();
//!
//!     let bytes = std::fs::read("photo.png")?;
//!     session.select_image(InputImage::new(bytes, "image/png", PreviewHandle::detached()));
//!     session.set_instruction("Make the colors more vibrant");
//!
//!     if let Some(submission) = session.submit() {
//!         let outcome = submission.run(&editor).await;
//!         session.finish(submission.ticket(), outcome);
//!     }
//!
//!     if let Some(image) = session.result_image() {
//!         println!("edited image: {} bytes of data URI", image.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Design
//!
//! - One generation attempt in flight at a time: [`EditSession::submit`]
//!   silently refuses while a previous attempt is `Processing`.
//! - A generator never errors out: every failure mode folds into
//!   [`GenerationOutcome::Failure`], and the session only stores the message.
//! - Outcomes that arrive after the user has moved on (new image selected,
//!   session reset) are discarded by [`EditSession::finish`].

mod error;

pub mod encode;
pub mod gemini;
pub mod generate;
pub mod session;

pub use encode::{encode, EncodedPart};
pub use error::{EditError, Result};
pub use gemini::{GeminiEditor, GeminiEditorBuilder, EDIT_MODEL};
pub use generate::{GenerationOutcome, ImageGenerator};
pub use session::{
    EditSession, InputImage, PreviewHandle, SessionPhase, SessionView, Submission,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{EditError, Result};
    pub use crate::gemini::GeminiEditor;
    pub use crate::generate::{GenerationOutcome, ImageGenerator};
    pub use crate::session::{EditSession, InputImage, PreviewHandle, SessionPhase};
}
