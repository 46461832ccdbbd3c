use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use super::error::{GraphError, Result};

/// Relationship closeness. Raw datasets may carry any value; `adjust` only
/// ever stores values in `[1, 100]`.
pub type Strength = i32;

/// A person in the network. The node at index 0 is the viewing user.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Unique identity; primitives and positions follow it across rebinds.
	pub id: String,
	/// Text drawn under the node, if any.
	pub label: Option<String>,
	/// Colour bucket.
	pub group: Option<u32>,
}

impl GraphNode {
	/// A labelled node with no group.
	pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			label: Some(label.into()),
			group: None,
		}
	}
}

/// A relationship. Link `i` reads `strengths[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	/// Id of the node the link starts at, normally the root.
	pub source: String,
	/// Id of the node the link ends at.
	pub target: String,
}

impl GraphLink {
	/// Link between two node ids.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}

	/// Identity of the link primitive; stable while both endpoints are.
	pub fn key(&self) -> String {
		format!("{}->{}", self.source, self.target)
	}
}

/// A friend network as handed over by the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// People, root first.
	pub nodes: Vec<GraphNode>,
	/// Relationships, in strength order.
	pub links: Vec<GraphLink>,
}

impl GraphData {
	/// The viewing user, if there are any nodes at all.
	pub fn root(&self) -> Option<&GraphNode> {
		self.nodes.first()
	}

	/// Map of node id to its position in `nodes`.
	pub fn index_by_id(&self) -> HashMap<&str, usize> {
		self.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect()
	}

	/// Checks the invariants the layout relies on: a root exists, ids are
	/// unique and every link endpoint resolves.
	pub fn validate(&self) -> Result<()> {
		if self.nodes.is_empty() {
			return Err(GraphError::EmptyDataset);
		}
		let index = self.index_by_id();
		if index.len() != self.nodes.len() {
			let mut seen = HashMap::new();
			for node in &self.nodes {
				if seen.insert(node.id.as_str(), ()).is_some() {
					return Err(GraphError::DuplicateNode(node.id.clone()));
				}
			}
		}
		for (i, link) in self.links.iter().enumerate() {
			for id in [&link.source, &link.target] {
				if !index.contains_key(id.as_str()) {
					return Err(GraphError::DanglingReference {
						link: i,
						id: id.clone(),
					});
				}
			}
		}
		Ok(())
	}

	/// Resolves every link to `(source, target)` node indices.
	pub fn resolve_links(&self) -> Result<Vec<(usize, usize)>> {
		let index = self.index_by_id();
		self.links
			.iter()
			.enumerate()
			.map(|(i, link)| {
				let lookup = |id: &String| {
					index
						.get(id.as_str())
						.copied()
						.ok_or_else(|| GraphError::DanglingReference {
							link: i,
							id: id.clone(),
						})
				};
				Ok((lookup(&link.source)?, lookup(&link.target)?))
			})
			.collect()
	}
}

/// Immutable per-link strength sequence. Every update yields a new value
/// with a bumped revision, so consumers can tell a change from a re-read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Strengths {
	values: Arc<[Strength]>,
	revision: u64,
}

impl Strengths {
	/// Wraps `values` as revision 0.
	pub fn new(values: impl Into<Arc<[Strength]>>) -> Self {
		Self {
			values: values.into(),
			revision: 0,
		}
	}

	/// Number of updates since [`Strengths::new`].
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Returns a new sequence with `index` replaced by `value`.
	pub fn with(&self, index: usize, value: Strength) -> Self {
		let mut values = self.values.to_vec();
		values[index] = value;
		Self {
			values: values.into(),
			revision: self.revision + 1,
		}
	}
}

impl Deref for Strengths {
	type Target = [Strength];

	fn deref(&self) -> &[Strength] {
		&self.values
	}
}

impl From<Vec<Strength>> for Strengths {
	fn from(values: Vec<Strength>) -> Self {
		Self::new(values)
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	/// Root plus one friend per strength, each linked to the root.
	pub(crate) fn star(friends: usize) -> GraphData {
		let mut nodes = vec![GraphNode::new("me", "Me")];
		let mut links = Vec::new();
		for i in 1..=friends {
			nodes.push(GraphNode::new(format!("f{i}"), format!("Friend {i}")));
			links.push(GraphLink::new("me", format!("f{i}")));
		}
		GraphData { nodes, links }
	}

	#[test]
	fn valid_star_passes() {
		assert_eq!(star(3).validate(), Ok(()));
	}

	#[test]
	fn empty_dataset_has_no_root() {
		assert_eq!(GraphData::default().validate(), Err(GraphError::EmptyDataset));
	}

	#[test]
	fn dangling_link_is_rejected() {
		let mut data = star(1);
		data.links.push(GraphLink::new("me", "ghost"));
		assert_eq!(
			data.validate(),
			Err(GraphError::DanglingReference {
				link: 1,
				id: "ghost".into()
			})
		);
		assert!(data.resolve_links().is_err());
	}

	#[test]
	fn duplicate_ids_are_rejected() {
		let mut data = star(2);
		data.nodes.push(GraphNode::new("f1", "Again"));
		assert_eq!(data.validate(), Err(GraphError::DuplicateNode("f1".into())));
	}

	#[test]
	fn links_resolve_by_identity_not_position() {
		let mut data = star(2);
		data.nodes.swap(1, 2);
		assert_eq!(data.resolve_links(), Ok(vec![(0, 2), (0, 1)]));
	}

	#[test]
	fn strength_update_is_a_new_sequence() {
		let a = Strengths::from(vec![10, 20]);
		let b = a.with(1, 30);
		assert_eq!(&*a, &[10, 20]);
		assert_eq!(&*b, &[10, 30]);
		assert_eq!(b.revision(), a.revision() + 1);
	}
}
