//! Collapsible, force-laid-out referral network drawn on a canvas.

mod component;
mod hit;
mod interaction;
pub mod layout;
mod platform;
mod render;
mod state;
mod style;
pub mod transform;
mod types;

pub use component::ReferralNetwork;
pub use interaction::{ClickOutcome, NodeDetail, Tooltip};
pub use platform::{BrowserPlatform, Platform};
pub use state::{NetworkState, ViewTransform};
pub use types::{MISSING_EMAIL, NetworkData, NodeId, ReferralLink, ReferralNode, Role};
