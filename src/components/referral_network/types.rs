use serde::{Deserialize, Serialize};

/// Backend identifier of a person in the referral tree.
pub type NodeId = u64;

/// Shown in place of a missing email address.
pub const MISSING_EMAIL: &str = "No registrado";

/// Position of a node relative to the viewer of the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// The signed-in user, or the root of an admin-viewed network.
	Me,
	/// Whoever referred the signed-in user.
	Sponsor,
	/// Somebody downstream of the viewer.
	Referral,
}

/// One person in the network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferralNode {
	/// Backend id, unique within a network.
	pub id: NodeId,
	/// Given names, space separated.
	pub given_names: String,
	/// Family names, space separated.
	pub family_names: String,
	/// National identity document number.
	pub national_id: String,
	/// Contact phone.
	pub phone: String,
	/// Contact email, if registered.
	pub email: Option<String>,
	/// Number of people this person referred directly.
	pub referrals_count: u32,
	/// Where the person sits relative to the viewer.
	pub role: Role,
	/// Referral hops from the network root; 0 for the root and the sponsor.
	pub level: u32,
}

impl ReferralNode {
	/// First given name, used on the node label.
	pub fn first_given_name(&self) -> &str {
		first_token(&self.given_names)
	}

	/// First family name, used on the node label.
	pub fn first_family_name(&self) -> &str {
		first_token(&self.family_names)
	}

	/// All names, as shown in the tooltip and detail panel.
	pub fn full_name(&self) -> String {
		format!("{} {}", self.given_names.trim(), self.family_names.trim())
			.trim()
			.to_string()
	}

	/// The email, or the placeholder when none is registered.
	pub fn email_or_default(&self) -> &str {
		match self.email.as_deref() {
			Some(email) if !email.trim().is_empty() => email,
			_ => MISSING_EMAIL,
		}
	}
}

fn first_token(s: &str) -> &str {
	s.split_whitespace().next().unwrap_or("")
}

/// `source` referred `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferralLink {
	/// The referrer.
	pub source: NodeId,
	/// The referred person.
	pub target: NodeId,
}

/// A validated network as handed to the graph component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkData {
	/// Every person, in backend order.
	pub nodes: Vec<ReferralNode>,
	/// Referral relations between `nodes`.
	pub links: Vec<ReferralLink>,
}

impl NetworkData {
	/// True when there is nobody to draw.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Linear lookup by id.
	pub fn node(&self, id: NodeId) -> Option<&ReferralNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}


#[cfg(test)]
mod tests {
	use super::fixtures::node;
	use super::*;

	#[test]
	fn name_helpers_take_first_token() {
		let n = node(7, Role::Referral, 1, 0);
		assert_eq!(n.first_given_name(), "Ana7");
		assert_eq!(n.first_family_name(), "Perez7");
		assert_eq!(n.full_name(), "Ana7 Maria Perez7 Gomez");
	}

	#[test]
	fn blank_email_falls_back() {
		let mut n = node(1, Role::Me, 0, 0);
		assert_eq!(n.email_or_default(), MISSING_EMAIL);
		n.email = Some("  ".into());
		assert_eq!(n.email_or_default(), MISSING_EMAIL);
		n.email = Some("ana@example.com".into());
		assert_eq!(n.email_or_default(), "ana@example.com");
	}
}
