use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;
use log::error;

use super::network::{GRAPH_STYLE, LoadError, Loaded};
use crate::api::{ADMIN_TOKEN_KEY, NetworkClient, NetworkVisualization};
use crate::components::referral_network::{NetworkData, ReferralNetwork};
use crate::error::ApiError;

async fn load(id: Option<u64>) -> Result<NetworkVisualization, ApiError> {
	let client = NetworkClient::from_storage(ADMIN_TOKEN_KEY)?;
	let id = id.ok_or_else(|| ApiError::Status {
		status: 404,
		message: "red inexistente".to_string(),
	})?;
	client.admin_network(id).await
}

/// Any network by id, rendered for administrators.
#[component]
pub fn AdminNetwork() -> impl IntoView {
	let params = use_params_map();
	let loaded: Loaded<NetworkVisualization> = RwSignal::new(None);

	Effect::new(move |_| {
		let id = params.with(|p| p.get("id").and_then(|id| id.parse::<u64>().ok()));
		loaded.set(None);
		spawn_local(async move {
			let result = load(id).await;
			if let Err(ref err) = result {
				error!("loading admin network: {err}");
			}
			loaded.set(Some(result.map_err(|e| e.to_string())));
		});
	});

	let data = Signal::derive(move || {
		loaded.with(|l| match l {
			Some(Ok(v)) => v.data.clone(),
			_ => NetworkData::default(),
		})
	});

	let failure = Memo::new(move |_| loaded.with(|l| l.as_ref().and_then(|r| r.as_ref().err().cloned())));

	view! {
		<section class="network-page">
			{move || {
				loaded
					.with(|l| match l {
						Some(Ok(v)) => Some((v.network_name.clone(), v.root_name.clone(), v.total_nodes)),
						_ => None,
					})
					.map(|(name, root, total)| {
						view! {
							<header class="network-page__header">
								<h1>{name}</h1>
								<p>"Ra\u{00ED}z: " {root} " \u{00B7} " {total} " miembros"</p>
							</header>
						}
					})
			}}
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
