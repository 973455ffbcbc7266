use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MessageEvent, MouseEvent, WheelEvent, Window,
};

use crate::error::{Result, ViewError};
use crate::graph::{GraphData, NodeId};
use crate::render::{BrowserClock, RenderMode, SharedCapability};
use crate::view::{GraphView, Inbound, Outbound};

use super::render;
use super::scene::OrbitScene;
use super::state::ForceCanvas;

/// Pixels the pointer may travel between press and release and still count as a click.
const CLICK_SLOP: f64 = 3.0;

/// The backend currently bound to the canvas.
#[derive(Clone)]
enum Surface {
	Flat(Rc<RefCell<ForceCanvas>>),
	Orbit(Rc<RefCell<OrbitScene>>),
}

impl Surface {
	fn tick(&self, dt: f64) {
		match self {
			Self::Flat(canvas) => canvas.borrow_mut().tick(dt as f32),
			Self::Orbit(scene) => scene.borrow_mut().tick(dt),
		}
	}

	fn draw(&self, ctx: &CanvasRenderingContext2d) {
		match self {
			Self::Flat(canvas) => render::render_canvas(&canvas.borrow(), ctx),
			Self::Orbit(scene) => render::render_scene(&scene.borrow(), ctx),
		}
	}

	fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
		match self {
			Self::Flat(canvas) => canvas.borrow().node_at_position(x, y).map(|(_, id)| id),
			Self::Orbit(scene) => scene.borrow().node_at_position(x, y),
		}
	}
}

#[derive(Clone, Copy, Debug, Default)]
struct PointerState {
	down_at: Option<(f64, f64)>,
	last: (f64, f64),
	moved: bool,
}

/// `acquireVsCodeApi()` when running inside an editor webview.
fn acquire_host_api() -> Option<JsValue> {
	let acquire = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("acquireVsCodeApi")).ok()?;
	let acquire: js_sys::Function = acquire.dyn_into().ok()?;
	acquire.call0(&JsValue::NULL).ok()
}

/// Posts outbound messages to the editor API, or to the parent frame when standalone.
fn post_to_host(api: Option<&JsValue>, message: &Outbound) {
	let value = match serde_json::to_string(message).map(|json| js_sys::JSON::parse(&json)) {
		Ok(Ok(value)) => value,
		_ => {
			error!("could not encode {message:?}");
			return;
		}
	};
	let posted = match api {
		Some(api) => js_sys::Reflect::get(api, &JsValue::from_str("postMessage"))
			.and_then(|post| post.dyn_into::<js_sys::Function>().map_err(JsValue::from))
			.and_then(|post| post.call1(api, &value))
			.map(drop),
		None => web_sys::window()
			.and_then(|window| window.parent().ok().flatten())
			.map_or(Ok(()), |parent| parent.post_message(&value, "*")),
	};
	if let Err(err) = posted {
		warn!("postMessage failed: {err:?}");
	}
}

fn canvas_size(canvas: &HtmlCanvasElement, window: &Window, fullscreen: bool) -> (f64, f64) {
	if fullscreen {
		let dimension = |value: std::result::Result<JsValue, JsValue>| {
			value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
		};
		return (dimension(window.inner_width()), dimension(window.inner_height()));
	}
	canvas.parent_element().map_or((800.0, 600.0), |parent| {
		(parent.client_width() as f64, parent.client_height() as f64)
	})
}

fn pointer_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top())
}

/// The dependency graph panel.
///
/// Listens for host messages on `window`, drives a [`GraphView`] once per animation
/// frame and draws whichever backend the view's render mode selected. When no editor
/// host is present and `demo` is given, the demo graph is loaded instead.
#[component]
pub fn DependencyGraph(
	#[prop(default = None)] demo: Option<GraphData>,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let view: Rc<RefCell<Option<GraphView>>> = Rc::new(RefCell::new(None));
	let surface: Rc<RefCell<Option<Surface>>> = Rc::new(RefCell::new(None));
	let pointer = Rc::new(Cell::new(PointerState::default()));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let listeners: Rc<RefCell<Vec<Closure<dyn FnMut(web_sys::Event)>>>> =
		Rc::new(RefCell::new(Vec::new()));
	let (view_init, surface_init, animate_init) = (view.clone(), surface.clone(), animate.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return error!("2d context has an unexpected type"),
			},
			_ => return error!("canvas has no 2d context"),
		};

		let (w, h) = canvas_size(&canvas, &window, fullscreen);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		let size = Rc::new(Cell::new((w, h)));

		let (slot, factory_size) = (surface_init.clone(), size.clone());
		let factory = move |mode: RenderMode| -> Result<SharedCapability> {
			let (w, h) = factory_size.get();
			if w <= 0.0 || h <= 0.0 {
				return Err(ViewError::RenderInit {
					mode,
					reason: format!("canvas is {w}x{h}"),
				});
			}
			let capability: SharedCapability = match mode {
				RenderMode::TwoD => {
					let canvas = Rc::new(RefCell::new(ForceCanvas::new(w, h)));
					*slot.borrow_mut() = Some(Surface::Flat(canvas.clone()));
					canvas
				}
				RenderMode::ThreeD => {
					let scene = Rc::new(RefCell::new(OrbitScene::new(w, h)));
					*slot.borrow_mut() = Some(Surface::Orbit(scene.clone()));
					scene
				}
			};
			Ok(capability)
		};

		let host_api = acquire_host_api();
		let standalone = host_api.is_none();
		let graph_view = GraphView::new(factory, BrowserClock, move |message: &Outbound| {
			post_to_host(host_api.as_ref(), message)
		});
		*view_init.borrow_mut() = Some(graph_view);

		let view_msg = view_init.clone();
		let on_message = Closure::<dyn FnMut(web_sys::Event)>::new(move |ev: web_sys::Event| {
			let Ok(ev) = ev.dyn_into::<MessageEvent>() else {
				return;
			};
			let raw = match js_sys::JSON::stringify(&ev.data()) {
				Ok(raw) => String::from(raw),
				Err(err) => return warn!("unreadable message: {err:?}"),
			};
			if let Some(view) = view_msg.borrow_mut().as_mut() {
				view.handle_json(&raw);
			}
		});
		let _ = window.add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref());

		let (view_resize, canvas_resize) = (view_init.clone(), canvas.clone());
		let on_resize = Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = canvas_size(&canvas_resize, &win, fullscreen);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			size.set((nw, nh));
			if let Some(view) = view_resize.borrow_mut().as_mut() {
				let resize = Inbound::Resize {
					width: nw,
					height: nh,
				};
				if let Err(err) = view.handle_message(resize) {
					warn!("{err}");
				}
			}
		});
		let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
		listeners.borrow_mut().extend([on_message, on_resize]);

		if let Some(view) = view_init.borrow_mut().as_mut() {
			view.announce_ready();
			if let Some(data) = demo.clone().filter(|_| standalone) {
				info!("no editor host, loading demo graph");
				if let Err(err) = view.handle_message(Inbound::Data { data }) {
					warn!("{err}");
				}
			}
		}

		let (view_anim, surface_anim, animate_inner) =
			(view_init.clone(), surface_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(view) = view_anim.borrow_mut().as_mut() {
				view.tick();
			}
			let active = surface_anim.borrow().clone();
			if let Some(active) = active {
				active.tick(0.016);
				active.draw(&ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let canvas_el = move || canvas_ref.get().map(HtmlCanvasElement::from);

	let (surface_md, pointer_md, view_md) = (surface.clone(), pointer.clone(), view.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_el() else {
			return;
		};
		let (x, y) = pointer_position(&canvas, &ev);
		pointer_md.set(PointerState {
			down_at: Some((x, y)),
			last: (x, y),
			moved: false,
		});

		let active = surface_md.borrow().clone();
		match active {
			Some(Surface::Flat(canvas)) => {
				let mut s = canvas.borrow_mut();
				s.cancel_transition();
				if let Some((idx, _)) = s.node_at_position(x, y) {
					s.drag.active = true;
					s.drag.node_idx = Some(idx);
					s.drag.start_x = x;
					s.drag.start_y = y;
					let mut start = (0.0, 0.0);
					s.graph.visit_nodes(|node| {
						if node.index() == idx {
							start = (node.x(), node.y());
						}
					});
					(s.drag.node_start_x, s.drag.node_start_y) = start;
				} else {
					s.pan.active = true;
					s.pan.start_x = x;
					s.pan.start_y = y;
					s.pan.transform_start_x = s.transform.x;
					s.pan.transform_start_y = s.transform.y;
				}
			}
			Some(Surface::Orbit(_)) => {
				if let Some(view) = view_md.borrow_mut().as_mut() {
					view.set_user_interacting(true);
				}
			}
			None => {}
		}
	};

	let (surface_mm, pointer_mm) = (surface.clone(), pointer.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_el() else {
			return;
		};
		let (x, y) = pointer_position(&canvas, &ev);
		let mut state = pointer_mm.get();
		let Some((down_x, down_y)) = state.down_at else {
			return;
		};
		state.moved |= (x - down_x).hypot(y - down_y) > CLICK_SLOP;
		let (last_x, last_y) = state.last;
		state.last = (x, y);
		pointer_mm.set(state);

		let active = surface_mm.borrow().clone();
		match active {
			Some(Surface::Flat(canvas)) => {
				let mut s = canvas.borrow_mut();
				if s.drag.active {
					if let Some(idx) = s.drag.node_idx {
						let (dx, dy) = (
							(x - s.drag.start_x) / s.transform.k,
							(y - s.drag.start_y) / s.transform.k,
						);
						let (nx, ny) = (
							s.drag.node_start_x + dx as f32,
							s.drag.node_start_y + dy as f32,
						);
						s.graph.visit_nodes_mut(|node| {
							if node.index() == idx {
								node.data.x = nx;
								node.data.y = ny;
								node.data.is_anchor = true;
							}
						});
					}
				} else if s.pan.active {
					s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
					s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
				}
			}
			Some(Surface::Orbit(scene)) => scene.borrow_mut().orbit(x - last_x, y - last_y),
			None => {}
		}
	};

	let (surface_mu, pointer_mu, view_mu) = (surface.clone(), pointer.clone(), view.clone());
	let release = move |click: Option<(f64, f64)>| {
		let state = pointer_mu.replace(PointerState::default());
		if state.down_at.is_none() {
			return;
		}
		let active = surface_mu.borrow().clone();
		let clicked = click
			.filter(|_| !state.moved)
			.and_then(|(x, y)| active.as_ref()?.node_at(x, y));

		match &active {
			Some(Surface::Flat(canvas)) => {
				let mut s = canvas.borrow_mut();
				s.drag.active = false;
				s.drag.node_idx = None;
				s.pan.active = false;
			}
			Some(Surface::Orbit(_)) => {
				if let Some(view) = view_mu.borrow_mut().as_mut() {
					view.set_user_interacting(false);
				}
			}
			None => {}
		}

		if let (Some(id), Some(view)) = (clicked, view_mu.borrow().as_ref()) {
			view.node_clicked(&id);
		}
	};

	let release_up = release.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let position = canvas_el().map(|canvas| pointer_position(&canvas, &ev));
		release_up(position);
	};
	let on_mouseleave = move |_: MouseEvent| release(None);

	let surface_wh = surface.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_el() else {
			return;
		};
		let (x, y) = pointer_position(&canvas, &ev);
		let zoom_in = ev.delta_y() < 0.0;
		let active = surface_wh.borrow().clone();
		match active {
			Some(Surface::Flat(canvas)) => {
				canvas.borrow_mut().zoom_at(x, y, if zoom_in { 1.1 } else { 0.9 });
			}
			Some(Surface::Orbit(scene)) => scene.borrow_mut().dolly(if zoom_in { 0.9 } else { 1.1 }),
			None => {}
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="dependency-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
