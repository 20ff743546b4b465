//! # formstage-state — Form Session Orchestration
//!
//! Drives a multi-stage form fill on top of the pure evaluation pipeline in
//! `formstage-schema`.
//!
//! ## Components
//!
//! - **Session** (`session.rs`): [`FormSession`], the stage navigation state
//!   machine. `next` is gated on stage validation, `go_to` on the furthest
//!   stage reached, and `submit` re-validates the whole form before the
//!   payload leaves the session.
//!
//! - **Drafts** (`draft.rs`): the [`DraftStore`] collaborator with memory
//!   and file-backed implementations. Drafts are written after every
//!   accepted mutation and read back on open.
//!
//! - **Transport** (`transport.rs`): the [`SubmissionTransport`]
//!   collaborator. Only a writer-backed transport is provided.
//!
//! - **Config** (`config.rs`): [`SessionConfig`] from the environment.
//!
//! ## Design
//!
//! The stage index is a runtime value because the number of stages comes
//! from the schema. Transitions are methods returning `Result`; a refused
//! transition carries the error map that blocked it and leaves the session
//! on the same stage.

pub mod config;
pub mod draft;
pub mod session;
pub mod transport;

pub use config::{ConfigError, SessionConfig, DEFAULT_DRAFT_DIR};
pub use draft::{draft_key, DraftError, DraftStore, FileDraftStore, MemoryDraftStore};
pub use session::{
    FormSession, NavigationError, SessionError, StageTransitionRecord, SummaryEntry,
    TransitionKind,
};
pub use transport::{JsonWriterTransport, SubmissionTransport, TransportError};
