//! Errors raised while binding a dataset or composing forces.

use thiserror::Error;

/// Result type for graph binding and force composition.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Ways a dataset can be unfit for layout.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GraphError {
	/// The dataset has no nodes, so there is no root to center on.
	#[error("dataset has no nodes; the root node must exist at index 0")]
	EmptyDataset,

	/// Two nodes share the same identity.
	#[error("duplicate node id {0:?}")]
	DuplicateNode(String),

	/// A link names a node that is not in the dataset.
	#[error("dangling reference: link {link} points at unknown node {id:?}")]
	DanglingReference {
		/// Position of the offending link.
		link: usize,
		/// The identity that failed to resolve.
		id: String,
	},

	/// The strength sequence is not length-matched to the links.
	#[error("strength sequence has {strengths} entries but the dataset has {links} links")]
	StrengthCountMismatch {
		/// Number of links in the dataset.
		links: usize,
		/// Number of entries in the strength sequence.
		strengths: usize,
	},
}
