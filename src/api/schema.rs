//! Wire format of the network endpoints and its validation into `NetworkData`.

use std::collections::HashSet;

use log::{debug, warn};
use serde::Deserialize;

use crate::components::referral_network::{NetworkData, NodeId, ReferralLink, ReferralNode, Role};
use crate::error::SchemaError;

#[derive(Clone, Debug, Deserialize)]
pub struct NodeDto {
	pub id: NodeId,
	#[serde(default)]
	pub nombres: String,
	#[serde(default)]
	pub apellidos: String,
	#[serde(default)]
	pub cedula: String,
	#[serde(default)]
	pub telefono: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub referrals_count: i64,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub level: Option<i64>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct LinkDto {
	pub source: NodeId,
	pub target: NodeId,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NetworkDto {
	#[serde(default)]
	pub nodes: Vec<NodeDto>,
	#[serde(default)]
	pub links: Vec<LinkDto>,
}

/// Admin visualization payload: the network plus a header.
#[derive(Clone, Debug, Deserialize)]
pub struct AdminNetworkDto {
	#[serde(default)]
	pub network_name: String,
	#[serde(default)]
	pub root_name: String,
	#[serde(default)]
	pub total_nodes: u64,
	#[serde(flatten)]
	pub network: NetworkDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDto {
	pub error: String,
	#[serde(default)]
	pub detail: Option<String>,
}

impl ErrorDto {
	pub(crate) fn message(self) -> String {
		match self.detail {
			Some(detail) => format!("{}: {detail}", self.error),
			None => self.error,
		}
	}
}

fn parse_role(id: NodeId, tag: &str) -> Result<Role, SchemaError> {
	match tag {
		"me" => Ok(Role::Me),
		"sponsor" => Ok(Role::Sponsor),
		"referral" => Ok(Role::Referral),
		other => Err(SchemaError::UnknownRole {
			id,
			role: other.to_string(),
		}),
	}
}

impl TryFrom<NodeDto> for ReferralNode {
	type Error = SchemaError;

	fn try_from(dto: NodeDto) -> Result<Self, Self::Error> {
		let role = parse_role(dto.id, &dto.kind)?;
		let referrals_count = u32::try_from(dto.referrals_count).map_err(|_| SchemaError::NegativeCount {
			id: dto.id,
			count: dto.referrals_count,
		})?;
		// The backend places the sponsor one level above the root (-1).
		let level = match dto.level {
			None => 0,
			Some(level) => u32::try_from(level).unwrap_or_else(|_| {
				debug!("node {} level {level} shown at level 0", dto.id);
				0
			}),
		};
		Ok(ReferralNode {
			id: dto.id,
			given_names: dto.nombres,
			family_names: dto.apellidos,
			national_id: dto.cedula,
			phone: dto.telefono,
			email: dto.email.filter(|e| !e.trim().is_empty()),
			referrals_count,
			role,
			level,
		})
	}
}

impl TryFrom<NetworkDto> for NetworkData {
	type Error = SchemaError;

	fn try_from(dto: NetworkDto) -> Result<Self, Self::Error> {
		let mut seen = HashSet::with_capacity(dto.nodes.len());
		let mut nodes = Vec::with_capacity(dto.nodes.len());
		for node in dto.nodes {
			if !seen.insert(node.id) {
				return Err(SchemaError::DuplicateNode(node.id));
			}
			nodes.push(ReferralNode::try_from(node)?);
		}

		let links = dto
			.links
			.into_iter()
			.filter(|l| {
				let known = seen.contains(&l.source) && seen.contains(&l.target);
				if !known {
					warn!("dropping link {} -> {}: unknown endpoint", l.source, l.target);
				}
				known
			})
			.map(|l| ReferralLink {
				source: l.source,
				target: l.target,
			})
			.collect();

		Ok(NetworkData { nodes, links })
	}
}
