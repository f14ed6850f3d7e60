use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;

use crate::api::{NetworkClient, USER_TOKEN_KEY};
use crate::components::referral_network::{NetworkData, ReferralNetwork};

/// The graph fills its wrapper, so the wrapper carries the height.
pub(crate) const GRAPH_STYLE: &str = "position: relative; width: 100%; height: 500px;";

/// Fetch outcome shared by the network pages.
pub(crate) type Loaded<T> = RwSignal<Option<Result<T, String>>>;

#[component]
pub(crate) fn LoadError(message: String) -> impl IntoView {
	view! {
		<div class="network-error">
			<h2>"No se pudo cargar la red"</h2>
			<p>{message}</p>
		</div>
	}
}

/// The signed-in user's referral network.
#[component]
pub fn MyNetwork() -> impl IntoView {
	let loaded: Loaded<NetworkData> = RwSignal::new(None);

	spawn_local(async move {
		let result = match NetworkClient::from_storage(USER_TOKEN_KEY) {
			Ok(client) => client.my_network().await,
			Err(err) => Err(err),
		};
		if let Err(ref err) = result {
			error!("loading network: {err}");
		}
		loaded.set(Some(result.map_err(|e| e.to_string())));
	});

	let data = Signal::derive(move || {
		loaded.with(|l| match l {
			Some(Ok(data)) => data.clone(),
			_ => NetworkData::default(),
		})
	});
	let failure = Memo::new(move |_| loaded.with(|l| l.as_ref().and_then(|r| r.as_ref().err().cloned())));

	view! {
		<section class="network-page">
			<header class="network-page__header">
				<h1>"Mi Red de Referidos"</h1>
			</header>
			{move || match failure.get() {
				Some(message) => view! { <LoadError message=message /> }.into_any(),
				None => view! {
					<div class="network-page__graph" style=GRAPH_STYLE>
						<ReferralNetwork data=data />
					</div>
				}
				.into_any(),
			}}
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn graph_wrapper_has_a_fixed_height() {
		assert!(GRAPH_STYLE.contains("height: 500px;"));
		assert!(GRAPH_STYLE.contains("position: relative;"));
	}
}
