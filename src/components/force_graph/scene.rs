//! Visual primitives bound to dataset entities.
//!
//! Every node, label and link gets a primitive keyed by its identity. A
//! rebind keeps the primitive (and its last drawn position) for every
//! identity that survives, so an unchanged node never flickers.

use std::collections::{HashMap, HashSet};

use super::error::Result;
use super::simulation::StepFrame;
use super::types::{GraphData, GraphNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveId(u64);

#[derive(Clone, Debug)]
pub struct NodePrimitive {
	pub id: PrimitiveId,
	pub node: GraphNode,
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug)]
pub struct LabelPrimitive {
	pub id: PrimitiveId,
	pub text: String,
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug)]
pub struct LinkPrimitive {
	pub id: PrimitiveId,
	pub source: usize,
	pub target: usize,
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
}

/// Primitive ids produced by [`Scene::bind`], in dataset order.
#[derive(Clone, Debug, Default)]
pub struct SceneBinding {
	pub links: Vec<PrimitiveId>,
	pub nodes: Vec<PrimitiveId>,
	pub labels: Vec<PrimitiveId>,
	pub created: usize,
	pub removed: usize,
}

/// Receives the domain object of a clicked node.
pub trait SelectionSink {
	fn notify_selection(&self, node: &GraphNode);
}

impl<F: Fn(&GraphNode)> SelectionSink for F {
	fn notify_selection(&self, node: &GraphNode) {
		self(node)
	}
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

#[derive(Default)]
pub struct Scene {
	pub nodes: Vec<NodePrimitive>,
	pub labels: Vec<LabelPrimitive>,
	pub links: Vec<LinkPrimitive>,
	pub hover: HoverState,
	keys: HashMap<String, PrimitiveId>,
	index: HashMap<String, usize>,
	next_id: u64,
}

impl Scene {
	fn primitive_id(&mut self, key: String, created: &mut usize) -> PrimitiveId {
		if let Some(&id) = self.keys.get(&key) {
			return id;
		}
		self.next_id += 1;
		let id = PrimitiveId(self.next_id);
		self.keys.insert(key, id);
		*created += 1;
		id
	}

	/// Creates or reuses one primitive per node, label and link.
	pub fn bind(&mut self, data: &GraphData) -> Result<SceneBinding> {
		data.validate()?;
		let ends = data.resolve_links()?;

		let previous: HashMap<PrimitiveId, (f64, f64)> =
			self.nodes.iter().map(|n| (n.id, (n.x, n.y))).collect();
		let old_keys = self.keys.clone();
		let mut created = 0;

		let mut nodes = Vec::with_capacity(data.nodes.len());
		let mut labels = Vec::new();
		for node in &data.nodes {
			let id = self.primitive_id(format!("node:{}", node.id), &mut created);
			let (x, y) = previous.get(&id).copied().unwrap_or_default();
			nodes.push(NodePrimitive {
				id,
				node: node.clone(),
				x,
				y,
			});
			if let Some(text) = &node.label {
				let id = self.primitive_id(format!("label:{}", node.id), &mut created);
				labels.push(LabelPrimitive {
					id,
					text: text.clone(),
					x,
					y,
				});
			}
		}

		let mut links = Vec::with_capacity(ends.len());
		for (link, &(source, target)) in data.links.iter().zip(&ends) {
			let id = self.primitive_id(format!("link:{}", link.key()), &mut created);
			links.push(LinkPrimitive {
				id,
				source,
				target,
				x1: nodes[source].x,
				y1: nodes[source].y,
				x2: nodes[target].x,
				y2: nodes[target].y,
			});
		}

		let live: HashSet<PrimitiveId> = nodes
			.iter()
			.map(|n| n.id)
			.chain(labels.iter().map(|l| l.id))
			.chain(links.iter().map(|l| l.id))
			.collect();
		self.keys.retain(|_, id| live.contains(id));
		let removed = old_keys.len() - old_keys.values().filter(|id| live.contains(id)).count();

		self.index = data
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		self.hover = HoverState::default();

		let binding = SceneBinding {
			links: links.iter().map(|l| l.id).collect(),
			nodes: nodes.iter().map(|n| n.id).collect(),
			labels: labels.iter().map(|l| l.id).collect(),
			created,
			removed,
		};
		self.nodes = nodes;
		self.labels = labels;
		self.links = links;
		Ok(binding)
	}

	/// Copies the step's positions onto node and label primitives, then
	/// re-reads both endpoints for every link.
	pub fn reposition(&mut self, frame: &StepFrame) {
		for sim in frame.nodes {
			if let Some(&i) = self.index.get(&sim.id) {
				self.nodes[i].x = sim.x;
				self.nodes[i].y = sim.y;
			}
		}
		let labelled = self.nodes.iter().filter(|n| n.node.label.is_some());
		for (label, node) in self.labels.iter_mut().zip(labelled) {
			label.x = node.x;
			label.y = node.y;
		}
		for link in &mut self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			link.x1 = s.x;
			link.y1 = s.y;
			link.x2 = t.x;
			link.y2 = t.y;
		}
	}

	/// Index of the topmost node within `radius` of a graph-space point.
	pub fn hit_test(&self, gx: f64, gy: f64, radius: f64) -> Option<usize> {
		self.nodes.iter().rposition(|n| {
			let (dx, dy) = (n.x - gx, n.y - gy);
			(dx * dx + dy * dy).sqrt() < radius
		})
	}

	/// Forwards the node under a graph-space point to `sink`.
	pub fn click(&self, gx: f64, gy: f64, radius: f64, sink: &dyn SelectionSink) -> Option<usize> {
		let idx = self.hit_test(gx, gy, radius)?;
		self.select(idx, sink)
	}

	/// Forwards the node at `idx` to `sink`.
	pub fn select(&self, idx: usize, sink: &dyn SelectionSink) -> Option<usize> {
		let prim = self.nodes.get(idx)?;
		sink.notify_selection(&prim.node);
		Some(idx)
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the old highlight around while it fades out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for link in &self.links {
				if link.source == idx {
					self.hover.neighbors.insert(link.target);
				} else if link.target == idx {
					self.hover.neighbors.insert(link.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Eases the highlight toward its target.
	pub fn advance_hover(&mut self, dt: f64) {
		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}
}
