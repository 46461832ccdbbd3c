//! Builds the physical forces for one layout run.
//!
//! [`compose`] is a pure function of the dataset and the strength sequence
//! it is handed. Nothing here remembers a previous call, so a strength update
//! always flows in through the arguments rather than through captured state.

use super::config::LayoutConfig;
use super::error::{GraphError, Result};
use super::simulation::SimNode;
use super::types::{GraphData, Strength};

/// Desired spring length for a strength.
///
/// `growth_factor` only decides whether the cap applies; the returned length
/// is the unscaled strength. With strengths in `[1, 100]` the cap is never hit.
pub fn link_distance(strength: Strength, config: &LayoutConfig) -> f64 {
	let length = strength as f64;
	if length <= 0.0 {
		0.0
	} else if length * config.growth_factor > config.max_link_distance {
		config.max_link_distance
	} else {
		length
	}
}

/// Fixed-seed linear congruential source for nudging coincident points apart.
#[derive(Clone, Debug)]
pub struct Jiggle(u64);

impl Default for Jiggle {
	fn default() -> Self {
		Self(1)
	}
}

impl Jiggle {
	const A: u64 = 1_664_525;
	const C: u64 = 1_013_904_223;
	const M: u64 = 1 << 32;

	fn next_unit(&mut self) -> f64 {
		self.0 = (Self::A * self.0 + Self::C) % Self::M;
		self.0 as f64 / Self::M as f64
	}

	/// A tiny non-zero offset.
	pub fn next(&mut self) -> f64 {
		(self.next_unit() - 0.5) * 1e-6
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ManyBody {
	/// Per-node strength, indexed like the dataset's nodes.
	pub strengths: Vec<f64>,
}

impl ManyBody {
	const DISTANCE_MIN2: f64 = 1.0;

	fn apply(&self, nodes: &mut [SimNode], alpha: f64, jiggle: &mut Jiggle) {
		for i in 0..nodes.len() {
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for j in 0..nodes.len() {
				if i == j {
					continue;
				}
				let (mut x, mut y) = (nodes[j].x - nodes[i].x, nodes[j].y - nodes[i].y);
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = jiggle.next();
					l += x * x;
				}
				if y == 0.0 {
					y = jiggle.next();
					l += y * y;
				}
				if l < Self::DISTANCE_MIN2 {
					l = (Self::DISTANCE_MIN2 * l).sqrt();
				}
				let w = self.strengths[j] * alpha / l;
				dvx += x * w;
				dvy += y * w;
			}
			nodes[i].vx += dvx;
			nodes[i].vy += dvy;
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Collide {
	pub radius: f64,
	pub strength: f64,
}

impl Collide {
	fn apply(&self, nodes: &mut [SimNode], jiggle: &mut Jiggle) {
		let (ri, rj) = (self.radius, self.radius);
		let r = ri + rj;
		for i in 0..nodes.len() {
			let (xi, yi) = (nodes[i].x + nodes[i].vx, nodes[i].y + nodes[i].vy);
			for j in (i + 1)..nodes.len() {
				let mut x = xi - nodes[j].x - nodes[j].vx;
				let mut y = yi - nodes[j].y - nodes[j].vy;
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = jiggle.next();
					l += x * x;
				}
				if y == 0.0 {
					y = jiggle.next();
					l += y * y;
				}
				let d = l.sqrt();
				let k = (r - d) / d * self.strength;
				x *= k;
				y *= k;
				let share = (rj * rj) / (ri * ri + rj * rj);
				nodes[i].vx += x * share;
				nodes[i].vy += y * share;
				nodes[j].vx -= x * (1.0 - share);
				nodes[j].vy -= y * (1.0 - share);
			}
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Center {
	pub x: f64,
	pub y: f64,
	pub strength: f64,
}

impl Center {
	fn apply(&self, nodes: &mut [SimNode]) {
		if nodes.is_empty() {
			return;
		}
		let n = nodes.len() as f64;
		let (sx, sy) = nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (dx, dy) = (
			(sx / n - self.x) * self.strength,
			(sy / n - self.y) * self.strength,
		);
		for node in nodes {
			node.x -= dx;
			node.y -= dy;
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Spring {
	pub source: usize,
	pub target: usize,
	pub distance: f64,
	pub strength: f64,
	/// Share of the correction taken by the target.
	pub bias: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkForce {
	pub springs: Vec<Spring>,
}

impl LinkForce {
	fn apply(&self, nodes: &mut [SimNode], alpha: f64, jiggle: &mut Jiggle) {
		for spring in &self.springs {
			let (s, t) = (&nodes[spring.source], &nodes[spring.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = jiggle.next();
			}
			if y == 0.0 {
				y = jiggle.next();
			}
			let l = (x * x + y * y).sqrt();
			let k = (l - spring.distance) / l * alpha * spring.strength;
			x *= k;
			y *= k;
			let b = spring.bias;
			nodes[spring.target].vx -= x * b;
			nodes[spring.target].vy -= y * b;
			nodes[spring.source].vx += x * (1.0 - b);
			nodes[spring.source].vy += y * (1.0 - b);
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Force {
	Charge(ManyBody),
	Collide(Collide),
	Center(Center),
	Link(LinkForce),
}

impl Force {
	pub fn apply(&self, nodes: &mut [SimNode], alpha: f64, jiggle: &mut Jiggle) {
		match self {
			Force::Charge(f) => f.apply(nodes, alpha, jiggle),
			Force::Collide(f) => f.apply(nodes, jiggle),
			Force::Center(f) => f.apply(nodes),
			Force::Link(f) => f.apply(nodes, alpha, jiggle),
		}
	}
}

/// Named forces in the order they are applied each tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForceSet {
	forces: Vec<(&'static str, Force)>,
}

impl ForceSet {
	pub fn with(mut self, name: &'static str, force: Force) -> Self {
		self.forces.push((name, force));
		self
	}

	pub fn iter(&self) -> impl Iterator<Item = &Force> {
		self.forces.iter().map(|(_, f)| f)
	}

	pub fn names(&self) -> Vec<&'static str> {
		self.forces.iter().map(|(n, _)| *n).collect()
	}

	pub fn get(&self, name: &str) -> Option<&Force> {
		self.forces.iter().find(|(n, _)| *n == name).map(|(_, f)| f)
	}
}

/// Composes charge, collision, centering and link forces for a dataset.
pub fn compose(
	data: &GraphData,
	strengths: &[Strength],
	width: f64,
	height: f64,
	config: &LayoutConfig,
) -> Result<ForceSet> {
	if strengths.len() != data.links.len() {
		return Err(GraphError::StrengthCountMismatch {
			links: data.links.len(),
			strengths: strengths.len(),
		});
	}
	data.validate()?;
	let ends = data.resolve_links()?;

	let mut degree = vec![0usize; data.nodes.len()];
	for &(s, t) in &ends {
		degree[s] += 1;
		degree[t] += 1;
	}
	let springs = ends
		.iter()
		.zip(strengths)
		.map(|(&(source, target), &strength)| Spring {
			source,
			target,
			distance: link_distance(strength, config),
			strength: 1.0 / degree[source].min(degree[target]) as f64,
			bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
		})
		.collect();

	let charge = (0..data.nodes.len())
		.map(|i| {
			if i == 0 {
				config.charge * config.root_charge_factor
			} else {
				config.charge
			}
		})
		.collect();

	let mut set = ForceSet::default().with("charge", Force::Charge(ManyBody { strengths: charge }));
	if config.collide_radius > 0.0 {
		set = set.with(
			"collide",
			Force::Collide(Collide {
				radius: config.collide_radius,
				strength: 1.0,
			}),
		);
	}
	Ok(set
		.with(
			"center",
			Force::Center(Center {
				x: width / 2.0,
				y: height / 2.0,
				strength: config.center_strength,
			}),
		)
		.with("links", Force::Link(LinkForce { springs })))
}

#[cfg(test)]
mod tests {
	use super::super::types::tests::star;
	use super::*;

	fn springs(set: &ForceSet) -> &[Spring] {
		match set.get("links") {
			Some(Force::Link(link)) => &link.springs,
			other => panic!("expected link force, got {other:?}"),
		}
	}

	#[test]
	fn distance_is_the_strength_within_range() {
		let config = LayoutConfig::default();
		for s in 1..=100 {
			assert_eq!(link_distance(s, &config), s as f64);
		}
	}

	#[test]
	fn non_positive_strength_collapses_to_root() {
		let config = LayoutConfig::default();
		assert_eq!(link_distance(0, &config), 0.0);
		assert_eq!(link_distance(-7, &config), 0.0);
	}

	#[test]
	fn oversized_raw_strength_is_capped() {
		let config = LayoutConfig::default();
		assert_eq!(link_distance(101, &config), 500.0);
		assert_eq!(link_distance(100, &config), 100.0);
	}

	#[test]
	fn forces_come_in_application_order() {
		let set = compose(&star(2), &[20, 80], 800.0, 600.0, &LayoutConfig::default()).unwrap();
		assert_eq!(set.names(), vec!["charge", "collide", "center", "links"]);
	}

	#[test]
	fn root_repels_ten_times_harder() {
		let set = compose(&star(4), &[1, 2, 3, 4], 800.0, 600.0, &LayoutConfig::default()).unwrap();
		let Some(Force::Charge(body)) = set.get("charge") else {
			panic!("no charge force");
		};
		for other in &body.strengths[1..] {
			assert_eq!(body.strengths[0].abs(), 10.0 * other.abs());
			assert!(*other < 0.0);
		}
	}

	#[test]
	fn springs_read_their_own_strength() {
		let set = compose(&star(2), &[20, 80], 800.0, 600.0, &LayoutConfig::default()).unwrap();
		let springs = springs(&set);
		assert_eq!(springs[0].distance, 20.0);
		assert_eq!(springs[1].distance, 80.0);
		// leaf degree is 1, so each spring is at full strength
		assert_eq!(springs[0].strength, 1.0);
		// root has degree 2, so the leaf takes two thirds of each correction
		assert!((springs[0].bias - 2.0 / 3.0).abs() < 1e-12);
	}

	#[test]
	fn leaves_absorb_most_of_each_spring_correction() {
		let set = compose(&star(10), &[50; 10], 800.0, 600.0, &LayoutConfig::default()).unwrap();
		for spring in springs(&set) {
			assert_eq!(spring.source, 0);
			assert!((spring.bias - 10.0 / 11.0).abs() < 1e-12);
		}

		// leaves evenly on a circle 150 units beyond their rest length
		let mut nodes: Vec<SimNode> = std::iter::once(SimNode::at("me", 0.0, 0.0))
			.chain((1..=10).map(|i| {
				let angle = i as f64 * std::f64::consts::PI / 5.0;
				SimNode::at(format!("f{i}"), 200.0 * angle.cos(), 200.0 * angle.sin())
			}))
			.collect();
		if let Some(links) = set.get("links") {
			links.apply(&mut nodes, 1.0, &mut Jiggle::default());
		}
		let root = nodes[0].vx.hypot(nodes[0].vy);
		let leaf = nodes[1].vx.hypot(nodes[1].vy);
		assert!(root < 1e-6, "root pulled by {root}");
		assert!((leaf - 150.0 * 10.0 / 11.0).abs() < 1e-6, "leaf moved {leaf}");
	}

	#[test]
	fn springs_resolve_endpoints_by_identity() {
		let mut data = star(2);
		data.nodes.swap(1, 2);
		let set = compose(&data, &[20, 80], 800.0, 600.0, &LayoutConfig::default()).unwrap();
		let springs = springs(&set);
		assert_eq!((springs[0].source, springs[0].target), (0, 2));
		assert_eq!((springs[1].source, springs[1].target), (0, 1));
	}

	#[test]
	fn length_mismatch_is_reported_up_front() {
		let err = compose(&star(2), &[20], 800.0, 600.0, &LayoutConfig::default()).unwrap_err();
		assert_eq!(
			err,
			GraphError::StrengthCountMismatch {
				links: 2,
				strengths: 1
			}
		);
	}

	#[test]
	fn composing_twice_gives_the_same_forces() {
		let data = star(3);
		let config = LayoutConfig::default();
		let a = compose(&data, &[5, 6, 7], 640.0, 480.0, &config).unwrap();
		let b = compose(&data, &[5, 6, 7], 640.0, 480.0, &config).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn center_moves_centroid_to_midpoint() {
		let mut nodes = vec![SimNode::at("a", 0.0, 0.0), SimNode::at("b", 10.0, 20.0)];
		Center {
			x: 100.0,
			y: 50.0,
			strength: 1.0,
		}
		.apply(&mut nodes);
		let cx = (nodes[0].x + nodes[1].x) / 2.0;
		let cy = (nodes[0].y + nodes[1].y) / 2.0;
		assert!((cx - 100.0).abs() < 1e-9 && (cy - 50.0).abs() < 1e-9);
	}

	#[test]
	fn jiggle_is_tiny_and_nonzero() {
		let mut j = Jiggle::default();
		for _ in 0..100 {
			let v = j.next();
			assert!(v != 0.0 && v.abs() <= 0.5e-6);
		}
	}
}
