//! Session state machine for the edit workflow.
//!
//! [`EditSession`] owns everything currently on screen: the selected input
//! image, the instruction text, the latest outcome, and the phase. All
//! transitions pass through it, whether triggered by user actions or by a
//! generation attempt completing. Rendering stays outside: observers receive
//! a [`SessionView`] snapshot after every transition and draw from that.

use crate::encode::encode;
use crate::generate::{GenerationOutcome, ImageGenerator};

/// Phase of the edit session. Exactly one is active at any time and it
/// determines which outcome fields are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Nothing in flight, no outcome to show.
    #[default]
    Idle,
    /// A generation attempt is in flight.
    Processing,
    /// The last attempt produced a result image.
    Success,
    /// The last attempt failed; an error message is set.
    Error,
}

/// Ephemeral display reference for the selected image.
///
/// The release action runs exactly once: when the handle is replaced by a new
/// selection, or when its owner (ultimately the session) is dropped. It is
/// never left to run incidentally.
pub struct PreviewHandle {
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl PreviewHandle {
    /// Wraps a release action to run once the preview is no longer shown.
    pub fn new(on_release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_release: Some(Box::new(on_release)),
        }
    }

    /// A handle with nothing to revoke.
    pub fn detached() -> Self {
        Self { on_release: None }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("held", &self.on_release.is_some())
            .finish()
    }
}

/// The user-selected image: raw bytes, declared media type, preview handle.
///
/// Owned exclusively by the session; replacing it drops the previous preview.
#[derive(Debug)]
pub struct InputImage {
    bytes: Vec<u8>,
    media_type: String,
    preview: PreviewHandle,
}

impl InputImage {
    /// Creates an input image from raw bytes and their declared media type.
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, preview: PreviewHandle) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            preview,
        }
    }

    /// Raw image bytes as supplied by the file provider.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared media type (e.g. `image/png`), verbatim from the provider.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The preview handle tied to this image's lifetime.
    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

/// Snapshot handed to subscribers after every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Current phase.
    pub phase: SessionPhase,
    /// Whether an input image is selected.
    pub has_input: bool,
    /// Instruction text, verbatim.
    pub instruction: String,
    /// Result image data URI, when phase is `Success`.
    pub result_image: Option<String>,
    /// Failure message, when phase is `Error`.
    pub error_message: Option<String>,
}

/// One generation attempt handed out by [`EditSession::submit`].
///
/// The driver runs it to completion and feeds the outcome back through
/// [`EditSession::finish`] with the same ticket. The session stays free to
/// take user actions while the attempt is pending.
#[derive(Debug, Clone)]
pub struct Submission {
    ticket: u64,
    bytes: Vec<u8>,
    media_type: String,
    instruction: String,
}

impl Submission {
    /// Ticket identifying this attempt to [`EditSession::finish`].
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Encodes the image and runs the generator.
    ///
    /// An encode failure becomes a `Failure` outcome without any network
    /// call. Always resolves; never panics.
    pub async fn run<G>(&self, generator: &G) -> GenerationOutcome
    where
        G: ImageGenerator + ?Sized,
    {
        let part = match encode(self.bytes.as_slice(), self.media_type.clone()).await {
            Ok(part) => part,
            Err(err) => {
                tracing::error!("failed to encode input image: {err}");
                return GenerationOutcome::Failure {
                    message: err.to_string(),
                };
            }
        };

        generator.generate(&part, &self.instruction).await
    }
}

type Subscriber = Box<dyn FnMut(&SessionView) + Send>;

/// Single owner of the edit session state.
///
/// Driven by one logical thread: user actions call the transition methods
/// directly, and the asynchronous attempt outcome re-enters through
/// [`finish`](Self::finish), which drops anything stale.
#[derive(Default)]
pub struct EditSession {
    input: Option<InputImage>,
    instruction: String,
    result_image: Option<String>,
    error_message: Option<String>,
    phase: SessionPhase,
    ticket: u64,
    subscribers: Vec<Subscriber>,
}

impl EditSession {
    /// Creates an empty session in the `Idle` phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The selected input image, if any.
    pub fn input(&self) -> Option<&InputImage> {
        self.input.as_ref()
    }

    /// Instruction text, verbatim.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Result image data URI from the last successful attempt.
    pub fn result_image(&self) -> Option<&str> {
        self.result_image.as_deref()
    }

    /// Failure message from the last failed attempt.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Registers a state-change observer, called after every transition.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&SessionView) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            has_input: self.input.is_some(),
            instruction: self.instruction.clone(),
            result_image: self.result_image.clone(),
            error_message: self.error_message.clone(),
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let view = self.view();
        for subscriber in &mut self.subscribers {
            subscriber(&view);
        }
    }

    /// Replaces the input image, releasing the previous preview handle.
    ///
    /// Clears the result and error and returns to `Idle`. Legal in any phase.
    pub fn select_image(&mut self, image: InputImage) {
        // Dropping the previous InputImage releases its preview.
        self.input = Some(image);
        self.result_image = None;
        self.error_message = None;
        self.phase = SessionPhase::Idle;
        self.notify();
    }

    /// Stores the instruction text verbatim. Always legal.
    pub fn set_instruction(&mut self, text: impl Into<String>) {
        self.instruction = text.into();
        self.notify();
    }

    /// Starts a generation attempt when the guard passes; otherwise a silent
    /// no-op returning `None`.
    ///
    /// Guard: an input image is present, the instruction is non-empty after
    /// trimming, and no attempt is already in flight.
    pub fn submit(&mut self) -> Option<Submission> {
        if self.phase == SessionPhase::Processing || self.instruction.trim().is_empty() {
            return None;
        }
        let input = self.input.as_ref()?;

        let submission = Submission {
            ticket: self.ticket + 1,
            bytes: input.bytes.clone(),
            media_type: input.media_type.clone(),
            instruction: self.instruction.clone(),
        };

        self.ticket += 1;
        self.result_image = None;
        self.error_message = None;
        self.phase = SessionPhase::Processing;
        self.notify();

        Some(submission)
    }

    /// Applies an attempt's outcome.
    ///
    /// Outcomes from superseded attempts are dropped: the session must still
    /// be in `Processing` and the ticket must match the current attempt, or
    /// the outcome would clobber newer state.
    pub fn finish(&mut self, ticket: u64, outcome: GenerationOutcome) {
        if self.phase != SessionPhase::Processing || ticket != self.ticket {
            tracing::debug!(ticket, "discarding stale generation outcome");
            return;
        }

        match outcome {
            GenerationOutcome::Success { image } => {
                self.result_image = Some(image);
                self.phase = SessionPhase::Success;
            }
            GenerationOutcome::Failure { message } => {
                self.error_message = Some(message);
                self.phase = SessionPhase::Error;
            }
        }
        self.notify();
    }

    /// Clears the instruction and result and returns to `Idle`.
    ///
    /// The input image and its preview stay in place. Always legal.
    pub fn reset(&mut self) {
        self.instruction.clear();
        self.result_image = None;
        self.phase = SessionPhase::Idle;
        self.notify();
    }
}
