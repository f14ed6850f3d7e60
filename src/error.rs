//! Error types for the fetch boundary and configuration.

use thiserror::Error;

use crate::components::referral_network::NodeId;

/// A network payload that does not satisfy the graph's data model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
	/// Two nodes share an id.
	#[error("node {0} appears more than once")]
	DuplicateNode(NodeId),
	/// The `type` tag is not one of me, sponsor or referral.
	#[error("node {id} has unknown type {role:?}")]
	UnknownRole {
		/// Offending node.
		id: NodeId,
		/// Tag as sent.
		role: String,
	},
	/// A referral count below zero.
	#[error("node {id} has negative referral count {count}")]
	NegativeCount {
		/// Offending node.
		id: NodeId,
		/// Count as sent.
		count: i64,
	},
}

/// Failure while loading a network from the backend.
#[derive(Debug, Error)]
pub enum ApiError {
	/// The request never got a response.
	#[error("request failed: {0}")]
	Request(#[from] gloo_net::Error),
	/// Non-success status, with the server message when it sent one.
	#[error("server responded {status}: {message}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Server error text, or the status text.
		message: String,
	},
	/// The payload parsed but is not a valid network.
	#[error("invalid network payload: {0}")]
	Schema(#[from] SchemaError),
	/// No token in local storage.
	#[error("not signed in")]
	MissingToken,
}

/// A graph config document that does not parse.
#[derive(Debug, Error)]
#[error("invalid graph config: {0}")]
pub struct ConfigError(#[from] serde_json::Error);
