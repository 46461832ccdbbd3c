use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::LayoutConfig;
use super::feedback::RelayoutMode;
use super::render;
use super::state::ForceGraphState;
use super::types::{GraphData, GraphNode, Strengths};

const FRAME_DT: f64 = 0.016;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;

/// Keeps the animation loop cancellable from component cleanup.
#[derive(Clone, Default)]
struct FrameLoop {
	running: Rc<Cell<bool>>,
	frame_id: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
	fn cancel(&self) {
		self.running.set(false);
		if let (Some(id), Some(window)) = (self.frame_id.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
	}
}

fn viewport_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
	(dim(window.inner_width(), 800.0), dim(window.inner_height(), 600.0))
}

fn event_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Canvas view of a friend network.
///
/// `data` and `strengths` are owned by the host. A change to `data` rebinds
/// the scene and restarts layout; a change to `strengths` alone goes through
/// `mode`. Clicking a node hands it to `on_select`.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into)] strengths: Signal<Strengths>,
	#[prop(into)] on_select: Callback<GraphNode>,
	#[prop(optional)] config: LayoutConfig,
	#[prop(optional)] mode: RelayoutMode,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let frames = FrameLoop::default();
	let (state_init, animate_init, resize_cb_init, frames_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), frames.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			viewport_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("2d canvas context unavailable");
			return;
		};

		let mut graph = ForceGraphState::new(config.clone(), w, h);
		graph.mode = mode;
		graph.load(data.get_untracked(), strengths.get_untracked());
		*state_init.borrow_mut() = Some(graph);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = viewport_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, frames_anim) =
			(state_init.clone(), animate_init.clone(), frames_init.clone());
		frames_init.running.set(true);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !frames_anim.running.get() {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(FRAME_DT);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				if let Ok(id) = win.request_animation_frame(cb.as_ref().unchecked_ref()) {
					frames_anim.frame_id.set(Some(id));
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				frames_init.frame_id.set(Some(id));
			}
		}
	});

	// Host updates: a new dataset rebinds, new strengths alone relayout.
	let state_sync = state.clone();
	Effect::new(move |_| {
		let (data, strengths) = (data.get(), strengths.get());
		let mut guard = state_sync.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		if s.data != data {
			s.load(data, strengths);
		} else if s.strengths != strengths {
			s.apply_strengths(strengths);
		}
	});

	let frames_cleanup = StoredValue::new_local(frames);
	on_cleanup(move || {
		frames_cleanup.try_with_value(FrameLoop::cancel);
	});

	let canvas_of = move || -> Option<HtmlCanvasElement> { canvas_ref.get().map(Into::into) };

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_of() else {
			return;
		};
		let (x, y) = event_point(&canvas, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.press(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_of() else {
			return;
		};
		let (x, y) = event_point(&canvas, &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		// collect first: the host may react to the selection synchronously
		let picked = RefCell::new(None);
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.release(&|node: &GraphNode| *picked.borrow_mut() = Some(node.clone()));
		}
		if let Some(node) = picked.into_inner() {
			on_select.run(node);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_of() else {
			return;
		};
		let (x, y) = event_point(&canvas, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.viewport.zoom_wheel(ev.delta_y(), x, y);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
