//! Twitch sign-in via the OAuth 2.0 implicit grant
//!
//! # Module Layout
//!
//! - [`browser`]  -- `AuthBrowser` capability and the loopback implementation
//! - [`callback`] -- local redirect listener and fragment relay page
//! - [`flow`]     -- `AuthFlowController`, the sign-in / sign-out state machine
//! - [`request`]  -- authorization URL construction and redirect classification
//! - [`state`]    -- anti-forgery `state` nonce generation and verification

pub mod browser;
mod callback;
pub mod flow;
pub mod request;
pub mod state;
