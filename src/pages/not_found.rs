use leptos::prelude::*;

/// 404 page
#[component]
pub fn NotFound() -> impl IntoView {
	view! { <h1>"P\u{00E1}gina no encontrada"</h1> }
}
