use log::debug;
use web_sys::{Document, Element};

/// Page-level side effects the graph needs, kept behind a trait so the
/// interaction logic runs without a browser.
pub trait Platform {
	/// Show the pointer cursor over nodes, the default one elsewhere.
	fn set_pointer_cursor(&self, pointer: bool);
	/// True while the document is fullscreen.
	fn is_fullscreen(&self) -> bool;
	/// Ask for the container to go fullscreen.
	fn request_fullscreen(&self);
	/// Leave fullscreen.
	fn exit_fullscreen(&self);
}

/// `Platform` over the real document, with `container` as the element that
/// goes fullscreen.
pub struct BrowserPlatform {
	document: Document,
	container: Element,
}

impl BrowserPlatform {
	/// `None` outside a browser window.
	pub fn new(container: Element) -> Option<Self> {
		let document = web_sys::window()?.document()?;
		Some(Self { document, container })
	}
}

impl Platform for BrowserPlatform {
	fn set_pointer_cursor(&self, pointer: bool) {
		let Some(body) = self.document.body() else {
			return;
		};
		let _ = body
			.style()
			.set_property("cursor", if pointer { "pointer" } else { "default" });
	}

	fn is_fullscreen(&self) -> bool {
		self.document.fullscreen_element().is_some()
	}

	fn request_fullscreen(&self) {
		if let Err(err) = self.container.request_fullscreen() {
			debug!("fullscreen request rejected: {err:?}");
		}
	}

	fn exit_fullscreen(&self) {
		self.document.exit_fullscreen();
	}
}

#[cfg(test)]
pub(crate) mod mock {
	use std::cell::{Cell, RefCell};

	use super::Platform;

	#[derive(Default)]
	pub struct MockPlatform {
		pub fullscreen: Cell<bool>,
		pub cursor_calls: RefCell<Vec<bool>>,
	}

	impl Platform for MockPlatform {
		fn set_pointer_cursor(&self, pointer: bool) {
			self.cursor_calls.borrow_mut().push(pointer);
		}

		fn is_fullscreen(&self) -> bool {
			self.fullscreen.get()
		}

		fn request_fullscreen(&self) {
			self.fullscreen.set(true);
		}

		fn exit_fullscreen(&self) {
			self.fullscreen.set(false);
		}
	}
}
