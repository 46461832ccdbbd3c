/// Tunables for layout, stepping and the viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Many-body strength of every non-root node. Negative repels.
	pub charge: f64,
	/// Multiplier applied to `charge` for the root node.
	pub root_charge_factor: f64,
	/// Collision radius of every node; `0` disables the collision force.
	pub collide_radius: f64,
	/// Pull of the node centroid toward the canvas midpoint.
	pub center_strength: f64,
	/// Only decides whether a strength is clamped to `max_link_distance`.
	pub growth_factor: f64,
	/// Longest desired link length.
	pub max_link_distance: f64,
	/// A run converges once alpha falls below this.
	pub alpha_min: f64,
	/// Fraction of the gap to `alpha_target` closed each tick.
	pub alpha_decay: f64,
	/// Value alpha decays toward.
	pub alpha_target: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
	/// Ticks run synchronously before the first rendered frame.
	pub warmup_ticks: usize,
	/// Alpha a running layout is raised to in [`RelayoutMode::Reheat`].
	///
	/// [`RelayoutMode::Reheat`]: super::feedback::RelayoutMode::Reheat
	pub reheat_alpha: f64,
	/// Smallest viewport scale.
	pub min_zoom: f64,
	/// Largest viewport scale.
	pub max_zoom: f64,
	/// Drawn radius of a node, in graph units.
	pub node_radius: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		let alpha_min = 0.001;
		Self {
			charge: -500.0,
			root_charge_factor: 10.0,
			collide_radius: 100.0,
			center_strength: 1.0,
			growth_factor: 5.0,
			max_link_distance: 500.0,
			alpha_min,
			alpha_decay: 1.0 - f64::powf(alpha_min, 1.0 / 300.0),
			alpha_target: 0.0,
			velocity_decay: 0.4,
			warmup_ticks: 35,
			reheat_alpha: 0.3,
			min_zoom: 1.0,
			max_zoom: 3.0,
			node_radius: 24.0,
		}
	}
}

impl LayoutConfig {
	/// Springs and centering only; handy for checking link lengths.
	pub fn springs_only() -> Self {
		Self {
			charge: 0.0,
			collide_radius: 0.0,
			..Self::default()
		}
	}
}
