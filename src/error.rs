//! Error type shared by the view core.
//!
//! None of these ever reach the host page: [`crate::view::GraphView`] logs them and
//! carries on with "no visual change".

use thiserror::Error;

use crate::render::RenderMode;

/// Failures the view core can run into.
#[derive(Debug, Error)]
pub enum ViewError {
	/// The rendering capability for a mode could not be created.
	#[error("{mode} renderer unavailable: {reason}")]
	RenderInit {
		/// Mode that was being initialized.
		mode: RenderMode,
		/// Why the capability could not be created.
		reason: String,
	},
	/// An inbound message could not be decoded.
	#[error("malformed message: {0}")]
	Message(#[from] serde_json::Error),
	/// An inbound message carried a `type` this core does not handle.
	#[error("unknown message type `{0}`")]
	UnknownMessage(String),
	/// A controls patch produced an invalid controls record.
	#[error("invalid controls: {0}")]
	Controls(String),
}

/// Result alias used across the crate.
pub type Result<T, E = ViewError> = std::result::Result<T, E>;
