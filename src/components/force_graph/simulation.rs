//! Iterative integration of node positions under a [`ForceSet`].
//!
//! A [`Simulation`] is one run: seeded once, stepped until its energy
//! (`alpha`) decays under the floor, then discarded. The [`Engine`] keeps at
//! most one run alive and hands out [`RunHandle`]s so a superseded run can
//! never be stepped again.

use std::f64::consts::PI;

use log::{debug, info};

use super::config::LayoutConfig;
use super::forces::{ForceSet, Jiggle};
use super::types::GraphData;

const INITIAL_RADIUS: f64 = 10.0;

/// Position and velocity of one node, owned by the active run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned position; the integrator snaps the node here each tick.
	pub fixed: Option<(f64, f64)>,
}

impl SimNode {
	pub fn at(id: impl Into<String>, x: f64, y: f64) -> Self {
		Self {
			id: id.into(),
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			fixed: None,
		}
	}
}

/// Initial positions for a run. Nodes present in `previous` keep their
/// position (with velocity reset); new nodes are laid out on a phyllotaxis
/// spiral so no two start on the same point.
pub fn seed_nodes(data: &GraphData, previous: &[SimNode]) -> Vec<SimNode> {
	let angle_step = PI * (3.0 - 5f64.sqrt());
	data.nodes
		.iter()
		.enumerate()
		.map(|(i, node)| match previous.iter().find(|p| p.id == node.id) {
			Some(p) => SimNode {
				fixed: p.fixed,
				..SimNode::at(node.id.clone(), p.x, p.y)
			},
			None => {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * angle_step;
				SimNode::at(node.id.clone(), radius * angle.cos(), radius * angle.sin())
			}
		})
		.collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Initializing,
	Stepping,
	Converged,
	Stopped,
}

pub struct Simulation {
	nodes: Vec<SimNode>,
	forces: ForceSet,
	alpha: f64,
	alpha_min: f64,
	alpha_decay: f64,
	alpha_target: f64,
	velocity_decay: f64,
	phase: Phase,
	step: u64,
	jiggle: Jiggle,
}

impl Simulation {
	pub fn new(forces: ForceSet, nodes: Vec<SimNode>, config: &LayoutConfig) -> Self {
		Self {
			nodes,
			forces,
			alpha: 1.0,
			alpha_min: config.alpha_min,
			alpha_decay: config.alpha_decay,
			alpha_target: config.alpha_target,
			velocity_decay: config.velocity_decay,
			phase: Phase::Initializing,
			step: 0,
			jiggle: Jiggle::default(),
		}
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn step_count(&self) -> u64 {
		self.step
	}

	pub fn is_active(&self) -> bool {
		matches!(self.phase, Phase::Initializing | Phase::Stepping)
	}

	/// Advances one fixed timestep. Does nothing once converged or stopped.
	pub fn tick(&mut self) {
		if !self.is_active() {
			return;
		}
		self.phase = Phase::Stepping;
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

		for force in self.forces.iter() {
			force.apply(&mut self.nodes, self.alpha, &mut self.jiggle);
		}

		let keep = 1.0 - self.velocity_decay;
		for node in &mut self.nodes {
			match node.fixed {
				Some((fx, fy)) => {
					node.x = fx;
					node.y = fy;
					node.vx = 0.0;
					node.vy = 0.0;
				}
				None => {
					node.vx *= keep;
					node.vy *= keep;
					node.x += node.vx;
					node.y += node.vy;
				}
			}
		}
		self.step += 1;

		if self.alpha < self.alpha_min {
			self.phase = Phase::Converged;
			debug!("layout converged after {} steps", self.step);
		}
	}

	/// Runs `ticks` steps synchronously, without any step callback.
	pub fn warm_up(&mut self, ticks: usize) {
		for _ in 0..ticks {
			self.tick();
		}
	}

	/// Steps until converged or `max_steps` more steps have run.
	pub fn run_to_convergence(&mut self, max_steps: usize) -> usize {
		let start = self.step;
		for _ in 0..max_steps {
			if !self.is_active() {
				break;
			}
			self.tick();
		}
		(self.step - start) as usize
	}

	pub fn stop(&mut self) {
		self.phase = Phase::Stopped;
	}

	/// Swaps the forces of a live run without reseeding it.
	pub fn replace_forces(&mut self, forces: ForceSet) {
		self.forces = forces;
	}

	/// Raises alpha and resumes stepping a converged run.
	pub fn reheat(&mut self, alpha: f64) {
		if self.phase == Phase::Stopped {
			return;
		}
		self.alpha = self.alpha.max(alpha);
		if self.phase == Phase::Converged {
			self.phase = Phase::Stepping;
		}
	}

	/// Holds a node at `(x, y)` until [`unpin`](Self::unpin) is called.
	pub fn pin(&mut self, id: &str, x: f64, y: f64) {
		if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
			node.fixed = Some((x, y));
			node.x = x;
			node.y = y;
		}
	}

	pub fn unpin(&mut self, id: &str) {
		if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
			node.fixed = None;
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub u64);

/// Ticket for stepping one particular run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunHandle {
	run: RunId,
}

impl RunHandle {
	pub fn run(&self) -> RunId {
		self.run
	}
}

/// What a step callback sees.
#[derive(Debug)]
pub struct StepFrame<'a> {
	pub run: RunId,
	pub step: u64,
	pub alpha: f64,
	pub nodes: &'a [SimNode],
}

/// Owner of the single active run.
#[derive(Default)]
pub struct Engine {
	current: Option<(RunId, Simulation)>,
	runs: u64,
}

impl Engine {
	/// Stops and drops the current run, then starts a new one and consumes
	/// its warm-up ticks before returning.
	pub fn start(&mut self, forces: ForceSet, nodes: Vec<SimNode>, config: &LayoutConfig) -> RunHandle {
		if let Some((id, mut old)) = self.current.take() {
			old.stop();
			debug!("stopped layout run {} at step {}", id.0, old.step_count());
		}
		self.runs += 1;
		let run = RunId(self.runs);
		let mut sim = Simulation::new(forces, nodes, config);
		sim.warm_up(config.warmup_ticks);
		info!(
			"started layout run {} ({} nodes, {} warm-up ticks)",
			run.0,
			sim.nodes().len(),
			config.warmup_ticks
		);
		self.current = Some((run, sim));
		RunHandle { run }
	}

	pub fn is_current(&self, handle: RunHandle) -> bool {
		matches!(self.current, Some((id, _)) if id == handle.run)
	}

	/// Advances the run behind `handle` by one step and reports it to
	/// `on_step`. Returns `false`, without calling back, when the handle is
	/// stale or the run has finished.
	pub fn step(&mut self, handle: RunHandle, on_step: impl FnOnce(&StepFrame)) -> bool {
		let Some((id, sim)) = self.current.as_mut() else {
			return false;
		};
		if *id != handle.run || !sim.is_active() {
			return false;
		}
		sim.tick();
		on_step(&StepFrame {
			run: *id,
			step: sim.step_count(),
			alpha: sim.alpha(),
			nodes: sim.nodes(),
		});
		true
	}

	/// The current run's latest positions, as a step callback would see them.
	pub fn frame(&self) -> Option<StepFrame<'_>> {
		self.current.as_ref().map(|(id, sim)| StepFrame {
			run: *id,
			step: sim.step_count(),
			alpha: sim.alpha(),
			nodes: sim.nodes(),
		})
	}

	pub fn simulation(&self) -> Option<&Simulation> {
		self.current.as_ref().map(|(_, sim)| sim)
	}

	pub fn simulation_mut(&mut self) -> Option<&mut Simulation> {
		self.current.as_mut().map(|(_, sim)| sim)
	}

	/// Positions of the current run, or nothing before the first start.
	pub fn nodes(&self) -> &[SimNode] {
		self.simulation().map(Simulation::nodes).unwrap_or(&[])
	}

	pub fn stop(&mut self) {
		if let Some((_, sim)) = self.current.as_mut() {
			sim.stop();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::forces::compose;
	use super::super::types::tests::star;
	use super::*;

	const W: f64 = 800.0;
	const H: f64 = 600.0;

	fn dist(a: &SimNode, b: &SimNode) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	fn converge(strengths: &[i32], config: &LayoutConfig) -> Simulation {
		let data = star(strengths.len());
		let forces = compose(&data, strengths, W, H, config).unwrap();
		let mut sim = Simulation::new(forces, seed_nodes(&data, &[]), config);
		sim.run_to_convergence(10_000);
		sim
	}

	#[test]
	fn seeds_are_distinct() {
		let nodes = seed_nodes(&star(5), &[]);
		for i in 0..nodes.len() {
			for j in (i + 1)..nodes.len() {
				assert!(dist(&nodes[i], &nodes[j]) > 1.0);
			}
		}
	}

	#[test]
	fn reseeding_keeps_known_positions() {
		let data = star(2);
		let previous = vec![SimNode {
			vx: 9.0,
			..SimNode::at("f1", 42.0, -3.0)
		}];
		let nodes = seed_nodes(&data, &previous);
		assert_eq!((nodes[1].x, nodes[1].y, nodes[1].vx), (42.0, -3.0, 0.0));
	}

	#[test]
	fn phases_progress_to_converged() {
		let config = LayoutConfig::springs_only();
		let data = star(1);
		let forces = compose(&data, &[50], W, H, &config).unwrap();
		let mut sim = Simulation::new(forces, seed_nodes(&data, &[]), &config);
		assert_eq!(sim.phase(), Phase::Initializing);
		sim.tick();
		assert_eq!(sim.phase(), Phase::Stepping);
		assert!(sim.alpha() < 1.0);
		sim.run_to_convergence(10_000);
		assert_eq!(sim.phase(), Phase::Converged);
		assert!(sim.alpha() < config.alpha_min);
		sim.stop();
		assert_eq!(sim.phase(), Phase::Stopped);
	}

	#[test]
	fn decay_floor_bounds_the_step_count() {
		let sim = converge(&[20, 80], &LayoutConfig::default());
		assert!(sim.step_count() <= 301, "took {} steps", sim.step_count());
		assert!(sim.step_count() >= 299);
	}

	#[test]
	fn springs_settle_at_their_strength() {
		let sim = converge(&[20, 80], &LayoutConfig::springs_only());
		let n = sim.nodes();
		assert!((dist(&n[0], &n[1]) - 20.0).abs() < 0.5, "{}", dist(&n[0], &n[1]));
		assert!((dist(&n[0], &n[2]) - 80.0).abs() < 0.5, "{}", dist(&n[0], &n[2]));
	}

	#[test]
	fn zero_strength_collapses_onto_root() {
		let sim = converge(&[0, 80], &LayoutConfig::springs_only());
		let n = sim.nodes();
		assert!(dist(&n[0], &n[1]) < 0.5);
	}

	#[test]
	fn collision_keeps_nodes_apart_by_default() {
		let sim = converge(&[20, 80], &LayoutConfig::default());
		let n = sim.nodes();
		assert!(dist(&n[0], &n[1]) > 180.0);
		assert!(dist(&n[0], &n[2]) > 180.0);
	}

	#[test]
	fn weaker_tie_sits_further_out_under_repulsion() {
		let config = LayoutConfig {
			collide_radius: 0.0,
			..LayoutConfig::default()
		};
		let sim = converge(&[20, 80], &config);
		let n = sim.nodes();
		assert!(dist(&n[0], &n[1]) < dist(&n[0], &n[2]));
	}

	#[test]
	fn graph_is_centered_on_the_canvas() {
		let sim = converge(&[30, 60, 90], &LayoutConfig::default());
		let n = sim.nodes();
		let cx = n.iter().map(|p| p.x).sum::<f64>() / n.len() as f64;
		let cy = n.iter().map(|p| p.y).sum::<f64>() / n.len() as f64;
		assert!((cx - W / 2.0).abs() < 1.0 && (cy - H / 2.0).abs() < 1.0);
	}

	#[test]
	fn pinned_node_stays_put() {
		let config = LayoutConfig::default();
		let data = star(2);
		let forces = compose(&data, &[20, 80], W, H, &config).unwrap();
		let mut sim = Simulation::new(forces, seed_nodes(&data, &[]), &config);
		sim.pin("f2", 10.0, 10.0);
		sim.warm_up(20);
		assert_eq!((sim.nodes()[2].x, sim.nodes()[2].y), (10.0, 10.0));
		sim.unpin("f2");
		sim.tick();
		assert!(sim.nodes()[2].fixed.is_none());
	}

	#[test]
	fn reheat_resumes_a_converged_run() {
		let mut sim = converge(&[40], &LayoutConfig::springs_only());
		assert_eq!(sim.phase(), Phase::Converged);
		sim.reheat(0.3);
		assert!(sim.is_active());
		assert!(sim.run_to_convergence(10_000) > 0);
	}

	#[test]
	fn warm_up_is_consumed_before_first_callback() {
		let config = LayoutConfig::default();
		let data = star(1);
		let mut engine = Engine::default();
		let forces = compose(&data, &[50], W, H, &config).unwrap();
		let handle = engine.start(forces, seed_nodes(&data, &[]), &config);
		let mut seen = None;
		assert!(engine.step(handle, |frame| seen = Some(frame.step)));
		assert_eq!(seen, Some(config.warmup_ticks as u64 + 1));
	}

	#[test]
	fn steps_fire_in_order_until_converged() {
		let config = LayoutConfig::default();
		let data = star(2);
		let mut engine = Engine::default();
		let forces = compose(&data, &[20, 80], W, H, &config).unwrap();
		let handle = engine.start(forces, seed_nodes(&data, &[]), &config);
		let mut steps = Vec::new();
		while engine.step(handle, |frame| steps.push(frame.step)) {}
		assert!(!steps.is_empty());
		assert!(steps.windows(2).all(|w| w[1] == w[0] + 1));
		assert_eq!(engine.simulation().map(Simulation::phase), Some(Phase::Converged));
		assert!(!engine.step(handle, |_| panic!("stepped a converged run")));
	}

	#[test]
	fn new_run_supersedes_the_old_one() {
		let config = LayoutConfig::default();
		let data = star(1);
		let mut engine = Engine::default();
		let forces = compose(&data, &[50], W, H, &config).unwrap();
		let first = engine.start(forces.clone(), seed_nodes(&data, &[]), &config);
		assert!(engine.step(first, |_| {}));

		let second = engine.start(forces, seed_nodes(&data, engine.nodes()), &config);
		assert!(!engine.is_current(first));
		assert!(!engine.step(first, |_| panic!("superseded run stepped")));

		let mut run = None;
		assert!(engine.step(second, |frame| run = Some(frame.run)));
		assert_eq!(run, Some(second.run()));
	}
}
