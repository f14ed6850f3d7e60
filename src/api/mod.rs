//! REST client for the referral network endpoints.

pub(crate) mod schema;

use gloo_net::http::{Request, Response};
use log::{debug, info};
use serde::de::DeserializeOwned;

use crate::components::referral_network::NetworkData;
use crate::config;
use crate::error::ApiError;
use schema::{AdminNetworkDto, ErrorDto, NetworkDto};

/// Local storage key of a signed-in user's token.
pub const USER_TOKEN_KEY: &str = "token";
/// Local storage key of an administrator's token.
pub const ADMIN_TOKEN_KEY: &str = "adminToken";

/// A network as served by the admin visualization endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkVisualization {
	/// Display name of the network.
	pub network_name: String,
	/// Name of the network root.
	pub root_name: String,
	/// Member count reported by the backend.
	pub total_nodes: u64,
	/// The validated network.
	pub data: NetworkData,
}

/// Reads a previously issued token from browser local storage.
pub fn stored_token(key: &str) -> Option<String> {
	web_sys::window()?
		.local_storage()
		.ok()??
		.get_item(key)
		.ok()?
		.filter(|t| !t.is_empty())
}

/// Authenticated client for the network endpoints.
pub struct NetworkClient {
	base_url: String,
	token: String,
}

impl NetworkClient {
	/// Client for `base_url` sending `token`.
	pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into().trim_end_matches('/').to_string(),
			token: token.into(),
		}
	}

	/// Client against the configured API using the token stored under `key`.
	pub fn from_storage(key: &str) -> Result<Self, ApiError> {
		let token = stored_token(key).ok_or(ApiError::MissingToken)?;
		Ok(Self::new(config::api_url(), token))
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
		let url = self.url(path);
		debug!("GET {url}");
		let response = Request::get(&url)
			.header("Authorization", &format!("Token {}", self.token))
			.send()
			.await?;
		if !response.ok() {
			return Err(status_error(response).await);
		}
		Ok(response.json::<T>().await?)
	}

	/// The signed-in user's own network.
	pub async fn my_network(&self) -> Result<NetworkData, ApiError> {
		let dto: NetworkDto = self.get("auth/network/").await?;
		let data = NetworkData::try_from(dto)?;
		info!("loaded network: {} nodes, {} links", data.nodes.len(), data.links.len());
		Ok(data)
	}

	/// Any network by id, for administrators.
	pub async fn admin_network(&self, id: u64) -> Result<NetworkVisualization, ApiError> {
		let dto: AdminNetworkDto = self.get(&format!("admin/networks/{id}/visualization/")).await?;
		let data = NetworkData::try_from(dto.network)?;
		info!("loaded network {id} ({}): {} nodes", dto.network_name, data.nodes.len());
		Ok(NetworkVisualization {
			network_name: dto.network_name,
			root_name: dto.root_name,
			total_nodes: dto.total_nodes,
			data,
		})
	}
}

async fn status_error(response: Response) -> ApiError {
	let status = response.status();
	let fallback = response.status_text();
	let message = match response.json::<ErrorDto>().await {
		Ok(body) => body.message(),
		Err(_) => fallback,
	};
	ApiError::Status { status, message }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn joins_paths_without_double_slashes() {
		let client = NetworkClient::new("http://localhost:8000/api/", "abc");
		assert_eq!(client.url("/auth/network/"), "http://localhost:8000/api/auth/network/");
		assert_eq!(
			client.url("admin/networks/3/visualization/"),
			"http://localhost:8000/api/admin/networks/3/visualization/"
		);
	}
}
