//! Page-level widgets.

pub mod referral_network;
