use log::{debug, warn};

use super::config::LayoutConfig;
use super::error::{GraphError, Result};
use super::feedback::RelayoutMode;
use super::forces::compose;
use super::scene::{Scene, SelectionSink};
use super::simulation::{Engine, RunHandle, seed_nodes};
use super::types::{GraphData, Strengths};
use super::viewport::Viewport;

/// Screen distance a press may travel and still count as a click.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

/// Everything the canvas needs between frames: the bound dataset, the
/// active layout run, the scene it feeds and the viewport over it.
pub struct ForceGraphState {
	pub data: GraphData,
	pub strengths: Strengths,
	pub config: LayoutConfig,
	pub mode: RelayoutMode,
	pub scene: Scene,
	pub viewport: Viewport,
	pub engine: Engine,
	pub drag: DragState,
	pub width: f64,
	pub height: f64,
	/// Why the current dataset could not be laid out, if it could not.
	pub error: Option<GraphError>,
	pub restarts: u64,
	run: Option<RunHandle>,
}

impl ForceGraphState {
	pub fn new(config: LayoutConfig, width: f64, height: f64) -> Self {
		Self {
			data: GraphData::default(),
			strengths: Strengths::default(),
			viewport: Viewport::new(config.min_zoom, config.max_zoom),
			config,
			mode: RelayoutMode::default(),
			scene: Scene::default(),
			engine: Engine::default(),
			drag: DragState::default(),
			width,
			height,
			error: None,
			restarts: 0,
			run: None,
		}
	}

	pub fn run(&self) -> Option<RunHandle> {
		self.run
	}

	/// Replaces the dataset and strengths wholesale and starts a new run.
	pub fn load(&mut self, data: GraphData, strengths: Strengths) {
		self.data = data;
		self.strengths = strengths;
		let result = self.scene.bind(&self.data).and_then(|binding| {
			debug!(
				"bound scene: {} created, {} removed",
				binding.created, binding.removed
			);
			self.restart()
		});
		self.record(result);
	}

	/// Reacts to a new strength sequence from the feedback loop.
	pub fn apply_strengths(&mut self, strengths: Strengths) {
		self.strengths = strengths;
		if self.error.is_some() && !matches!(self.error, Some(GraphError::StrengthCountMismatch { .. })) {
			return;
		}
		let result = match self.mode {
			RelayoutMode::Rebuild => self.restart(),
			RelayoutMode::Reheat => self.reheat(),
		};
		self.record(result);
	}

	fn record(&mut self, result: Result<()>) {
		match result {
			Ok(()) => self.error = None,
			Err(err) => {
				warn!("graph not laid out: {err}");
				self.engine.stop();
				self.run = None;
				self.error = Some(err);
			}
		}
	}

	fn restart(&mut self) -> Result<()> {
		let forces = compose(
			&self.data,
			&self.strengths,
			self.width,
			self.height,
			&self.config,
		)?;
		let seed = seed_nodes(&self.data, self.engine.nodes());
		self.run = Some(self.engine.start(forces, seed, &self.config));
		self.restarts += 1;
		if let Some(frame) = self.engine.frame() {
			self.scene.reposition(&frame);
		}
		Ok(())
	}

	fn reheat(&mut self) -> Result<()> {
		let live = self.run.is_some_and(|run| self.engine.is_current(run));
		if !live {
			return self.restart();
		}
		let forces = compose(
			&self.data,
			&self.strengths,
			self.width,
			self.height,
			&self.config,
		)?;
		if let Some(sim) = self.engine.simulation_mut() {
			sim.replace_forces(forces);
			sim.reheat(self.config.reheat_alpha);
		}
		Ok(())
	}

	/// One animation frame: steps the active run, if any, and eases hover.
	/// Returns whether the layout moved.
	pub fn tick(&mut self, dt: f64) -> bool {
		self.scene.advance_hover(dt);
		let Some(run) = self.run else {
			return false;
		};
		self.engine.step(run, |frame| self.scene.reposition(frame))
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.viewport.screen_to_graph(sx, sy);
		self.scene.hit_test(gx, gy, self.config.node_radius)
	}

	/// Starts dragging the node under the pointer, or panning when there is
	/// none.
	pub fn press(&mut self, sx: f64, sy: f64) {
		let Some(idx) = self.node_at_position(sx, sy) else {
			self.viewport.begin_pan(sx, sy);
			return;
		};
		let node = &self.scene.nodes[idx];
		self.drag = DragState {
			active: true,
			moved: false,
			node_idx: Some(idx),
			start_x: sx,
			start_y: sy,
			node_start_x: node.x,
			node_start_y: node.y,
		};
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(sx, sy);
			self.scene.set_hover(hovered);
			self.viewport.move_pan(sx, sy);
			return;
		}
		let Some(idx) = self.drag.node_idx else {
			return;
		};
		let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
		if !self.drag.moved && dx.hypot(dy) < CLICK_SLOP {
			return;
		}
		if !self.drag.moved {
			self.drag.moved = true;
			if let Some(sim) = self.engine.simulation_mut() {
				sim.reheat(self.config.reheat_alpha);
			}
		}
		let k = self.viewport.transform.k;
		let (nx, ny) = (self.drag.node_start_x + dx / k, self.drag.node_start_y + dy / k);
		let id = self.scene.nodes[idx].node.id.clone();
		if let Some(sim) = self.engine.simulation_mut() {
			sim.pin(&id, nx, ny);
		}
		if let Some(frame) = self.engine.frame() {
			self.scene.reposition(&frame);
		}
	}

	/// Ends a press. A press that never moved selects the node under it.
	pub fn release(&mut self, sink: &dyn SelectionSink) -> Option<usize> {
		self.viewport.end_pan();
		let drag = std::mem::take(&mut self.drag);
		let idx = drag.node_idx?;
		if drag.moved {
			let id = &self.scene.nodes[idx].node.id;
			if let Some(sim) = self.engine.simulation_mut() {
				sim.unpin(id);
			}
			return None;
		}
		self.scene.select(idx, sink)
	}

	pub fn leave(&mut self) {
		if let (true, Some(idx)) = (self.drag.moved, self.drag.node_idx) {
			let id = &self.scene.nodes[idx].node.id;
			if let Some(sim) = self.engine.simulation_mut() {
				sim.unpin(id);
			}
		}
		self.drag = DragState::default();
		self.viewport.end_pan();
		self.scene.set_hover(None);
	}

	/// Moves the centering target to the new canvas midpoint.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		if self.run.is_none() {
			return;
		}
		let result = self.reheat();
		self.record(result);
	}
}
