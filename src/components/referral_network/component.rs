use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, ResizeObserver, WheelEvent};

use crate::config::GraphConfig;

use super::interaction::{NodeDetail, Tooltip};
use super::platform::{BrowserPlatform, Platform};
use super::render;
use super::state::NetworkState;
use super::types::NetworkData;

type SharedState = Rc<RefCell<Option<NetworkState>>>;
type Callback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

// Overlays sit on top of the canvas at fixed spots of the container.
const CONTAINER_STYLE: &str = "position: relative; width: 100%; height: 100%; min-height: 320px; overflow: hidden;";
const CANVAS_STYLE: &str = "position: absolute; inset: 0; display: block; cursor: grab;";
const COVER_STYLE: &str = "position: absolute; inset: 0; z-index: 30; display: flex; flex-direction: column; \
	align-items: center; justify-content: center; background: rgba(255, 255, 255, 0.9);";
const TOOLTIP_STYLE: &str = "position: absolute; left: 50%; top: 10%; transform: translateX(-50%); z-index: 10; \
	pointer-events: none; background: rgba(255, 255, 255, 0.9); border: 2px solid #000; padding: 8px;";
const CONTROLS_STYLE: &str = "position: absolute; right: 16px; bottom: 16px; z-index: 10; display: flex; \
	flex-direction: column; gap: 8px;";
const DETAIL_STYLE: &str = "position: absolute; right: 16px; top: 16px; z-index: 20; width: 256px; \
	background: #fff; border: 2px solid #000; padding: 12px;";

/// Raised when the component unmounts; the frame loop tears down on its next run.
#[derive(Clone, Default)]
struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
	fn stop(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	fn is_stopped(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Browser-side hooks of one mounted instance.
#[derive(Clone, Default)]
struct Hooks {
	animate: Callback,
	resize: Callback,
	fullscreen: Callback,
	observer: Rc<RefCell<Option<ResizeObserver>>>,
}

impl Hooks {
	/// Unregister observers and drop everything but the running frame closure,
	/// which is released once the current frame returns.
	fn release(&self, state: &SharedState) {
		if let Some(observer) = self.observer.borrow_mut().take() {
			observer.disconnect();
		}
		if let Some(cb) = self.fullscreen.borrow_mut().take() {
			if let Some(document) = web_sys::window().and_then(|w| w.document()) {
				let _ = document.remove_event_listener_with_callback("fullscreenchange", cb.as_ref().unchecked_ref());
			}
		}
		self.resize.borrow_mut().take();
		state.borrow_mut().take();
		let animate = self.animate.clone();
		spawn_local(async move {
			animate.borrow_mut().take();
		});
		debug!("referral network unmounted");
	}
}

/// Overlay state mirrored out of the canvas loop into signals.
#[derive(Clone, Copy)]
struct Overlay {
	layout_ready: RwSignal<bool>,
	tooltip: RwSignal<Option<Tooltip>>,
	detail: RwSignal<Option<NodeDetail>>,
	fullscreen: RwSignal<bool>,
	close_requested: RwSignal<bool>,
}

impl Overlay {
	fn sync(&self, s: &mut NetworkState) {
		if self.close_requested.get_untracked() {
			self.close_requested.set(false);
			s.close_detail();
		}
		if self.layout_ready.get_untracked() != s.layout_ready() {
			self.layout_ready.set(s.layout_ready());
		}
		let tooltip = s.tooltip();
		if self.tooltip.with_untracked(|t| *t != tooltip) {
			self.tooltip.set(tooltip);
		}
		let detail = s.detail();
		if self.detail.with_untracked(|d| *d != detail) {
			self.detail.set(detail);
		}
		if self.fullscreen.get_untracked() != s.fullscreen {
			self.fullscreen.set(s.fullscreen);
		}
	}
}

fn sync_size(container: &web_sys::Element, canvas: &HtmlCanvasElement, state: &SharedState) {
	let (w, h) = (container.client_width() as f64, container.client_height() as f64);
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	if let Some(ref mut s) = *state.borrow_mut() {
		s.resize(w, h);
	}
}

fn pointer(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Interactive, collapsible referral tree drawn on a canvas.
#[component]
pub fn ReferralNetwork(
	/// Network to draw; a new value restarts the layout.
	#[prop(into)] data: Signal<NetworkData>,
	/// Graph settings; defaults when omitted.
	#[prop(optional)] config: Option<GraphConfig>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let hooks = Hooks::default();
	let stop = StopFlag::default();
	let config = config.unwrap_or_else(GraphConfig::from_env);
	let overlay = Overlay {
		layout_ready: RwSignal::new(false),
		tooltip: RwSignal::new(None),
		detail: RwSignal::new(None),
		fullscreen: RwSignal::new(false),
		close_requested: RwSignal::new(false),
	};
	let empty = Signal::derive(move || data.with(NetworkData::is_empty));

	let platform = move || {
		container_ref
			.get_untracked()
			.and_then(|el| BrowserPlatform::new(el.into()))
	};

	// Canvas, animation loop and passive observers are set up once.
	let (state_init, hooks_init, stop_init) = (state.clone(), hooks.clone(), stop.clone());
	Effect::new(move |initialized: Option<bool>| {
		if initialized == Some(true) {
			return true;
		}
		let (Some(container), Some(canvas)) = (container_ref.get(), canvas_ref.get()) else {
			return false;
		};
		let Some(window) = web_sys::window() else {
			return false;
		};
		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return false,
			},
			_ => {
				warn!("2d canvas context unavailable");
				return false;
			}
		};

		let (w, h) = (
			container.client_width() as f64,
			container.client_height() as f64,
		);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		*state_init.borrow_mut() = Some(NetworkState::new(
			Rc::new(data.get_untracked()),
			w,
			h,
			config.clone(),
		));

		// The container can change size without the window doing so.
		let (state_resize, canvas_resize, container_resize) =
			(state_init.clone(), canvas.clone(), container.clone());
		*hooks_init.resize.borrow_mut() = Some(Closure::new(move || {
			sync_size(&container_resize, &canvas_resize, &state_resize);
		}));
		if let Some(ref cb) = *hooks_init.resize.borrow() {
			match ResizeObserver::new(cb.as_ref().unchecked_ref()) {
				Ok(observer) => {
					observer.observe(&container);
					*hooks_init.observer.borrow_mut() = Some(observer);
				}
				Err(err) => warn!("resize observer unavailable: {err:?}"),
			}
		}

		let (state_fs, canvas_fs, container_fs) = (state_init.clone(), canvas.clone(), container.clone());
		*hooks_init.fullscreen.borrow_mut() = Some(Closure::new(move || {
			let Some(platform) = platform() else {
				return;
			};
			if let Some(ref mut s) = *state_fs.borrow_mut() {
				s.set_fullscreen(platform.is_fullscreen());
			}
			sync_size(&container_fs, &canvas_fs, &state_fs);
		}));
		if let (Some(document), Some(cb)) = (window.document(), hooks_init.fullscreen.borrow().as_ref()) {
			let _ = document.add_event_listener_with_callback("fullscreenchange", cb.as_ref().unchecked_ref());
		}

		let (state_anim, hooks_anim, stop_anim) = (state_init.clone(), hooks_init.clone(), stop_init.clone());
		*hooks_init.animate.borrow_mut() = Some(Closure::new(move || {
			if stop_anim.is_stopped() {
				hooks_anim.release(&state_anim);
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				if s.take_repaint() {
					render::render(s, &ctx);
				}
				overlay.sync(s);
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), hooks_anim.animate.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *hooks_init.animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
		true
	});

	let stop_cleanup = stop.clone();
	on_cleanup(move || stop_cleanup.stop());

	// New source data replaces the projection and restarts the layout.
	let state_data = state.clone();
	Effect::new(move |_| {
		let next = Rc::new(data.get());
		if let Some(ref mut s) = *state_data.borrow_mut() {
			s.set_data(next);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let (x, y) = pointer(&canvas, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.begin_pan(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let (Some(canvas), Some(platform)) = (canvas_ref.get_untracked(), platform()) else {
			return;
		};
		let (x, y) = pointer(&canvas, &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.pan.active {
				s.drag_pan(x, y);
			} else {
				s.hover_at(x, y, &platform);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let (x, y) = pointer(&canvas, &ev);
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.end_pan(x, y);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let Some(platform) = platform() else {
			return;
		};
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.cancel_pan(&platform);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let (x, y) = pointer(&canvas, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	// Control buttons all follow the same shape: borrow, act.
	let control = {
		let state = state.clone();
		move |action: fn(&mut NetworkState)| {
			let state = state.clone();
			move |_: MouseEvent| {
				if let Some(ref mut s) = *state.borrow_mut() {
					action(s);
				}
			}
		}
	};

	let state_fs = state.clone();
	let on_fullscreen = move |_: MouseEvent| {
		let Some(platform) = platform() else {
			return;
		};
		if let Some(ref s) = *state_fs.borrow() {
			s.toggle_fullscreen(&platform);
		}
	};

	view! {
		<div
			node_ref=container_ref
			class=move || {
				if overlay.fullscreen.get() {
					"referral-network referral-network--fullscreen"
				} else {
					"referral-network"
				}
			}
			style=CONTAINER_STYLE
		>
			<canvas
				node_ref=canvas_ref
				class="referral-network__canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style=CANVAS_STYLE
			/>

			<Show when=move || empty.get()>
				<div class="referral-network__empty" style=COVER_STYLE>"Cargando red..."</div>
			</Show>

			<Show when=move || !empty.get() && !overlay.layout_ready.get()>
				<div class="referral-network__loading" style=COVER_STYLE>
					<div class="referral-network__spinner"></div>
					<p>"Organizando red..."</p>
				</div>
			</Show>

			{move || {
				overlay
					.tooltip
					.get()
					.map(|tip| {
						view! {
							<div class="referral-network__tooltip" style=TOOLTIP_STYLE>
								<p class="referral-network__tooltip-name">{tip.name}</p>
								<p>"Tel: " {tip.phone}</p>
								<p>"Referidos: " {tip.referrals_count}</p>
								{tip.hint.map(|hint| view! { <p class="referral-network__hint">{hint}</p> })}
							</div>
						}
					})
			}}

			<div class="referral-network__controls" style=CONTROLS_STYLE>
				<button title="Acercar" on:click=control(NetworkState::zoom_in)>"+"</button>
				<button title="Alejar" on:click=control(NetworkState::zoom_out)>"\u{2212}"</button>
				<button title="Centrar" on:click=control(NetworkState::fit)>"\u{25CE}"</button>
				<button title="Expandir todo" on:click=control(NetworkState::expand_all)>
					"Expandir"
				</button>
				<button title="Contraer nivel 2+" on:click=control(NetworkState::collapse_default)>
					"Contraer"
				</button>
				<button
					title=move || {
						if overlay.fullscreen.get() { "Salir de Pantalla Completa" } else { "Pantalla Completa" }
					}
					on:click=on_fullscreen
				>
					"\u{26F6}"
				</button>
			</div>

			{move || {
				overlay
					.detail
					.get()
					.map(|detail| {
						view! {
							<div class="referral-network__detail" style=DETAIL_STYLE>
								<div class="referral-network__detail-title">
									<span>"Detalle de Usuario"</span>
									<button on:click=move |_| overlay.close_requested.set(true)>"\u{00D7}"</button>
								</div>
								<p class="referral-network__label">"Nombre Completo"</p>
								<p>{detail.full_name}</p>
								<p class="referral-network__label">"C\u{00E9}dula"</p>
								<p>{detail.national_id}</p>
								<p class="referral-network__label">"Tel\u{00E9}fono"</p>
								<p>{detail.phone}</p>
								<p class="referral-network__label">"Correo"</p>
								<p>{detail.email}</p>
								<p class="referral-network__referrals">
									"Referidos Directos: " {detail.referrals_count}
								</p>
							</div>
						}
					})
			}}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stop_reaches_every_clone() {
		let owner = StopFlag::default();
		let frame_loop = owner.clone();
		assert!(!frame_loop.is_stopped());
		owner.stop();
		assert!(frame_loop.is_stopped());
	}

	#[test]
	fn overlays_float_over_the_canvas() {
		for style in [CANVAS_STYLE, COVER_STYLE, TOOLTIP_STYLE, CONTROLS_STYLE, DETAIL_STYLE] {
			assert!(style.starts_with("position: absolute;"), "{style}");
		}
		assert!(CONTAINER_STYLE.contains("position: relative;"));
		assert!(TOOLTIP_STYLE.contains("left: 50%; top: 10%;"));
		assert!(CONTROLS_STYLE.contains("right: 16px; bottom: 16px;"));
		assert!(DETAIL_STYLE.contains("right: 16px; top: 16px;"));
	}
}
