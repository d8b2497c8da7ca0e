//! # Event model: what the generator emits.
//!
//! - [`Event`] the capability every publishable value exposes (key, destination, payload)
//! - [`Impression`] an ad shown to a user, one per scheduler tick
//! - [`Click`] a user interacting with a previously shown impression
//! - [`RandomSource`] seedable randomness for identifiers, campaigns, delays and click draws
//!
//! ## Wire shape
//! ```text
//! destination   key        value (JSON)
//! impressions   impr_id    {"impr_id","user_id","campaign_id","ts"}
//! clicks        click_id   {"click_id","impr_id","user_id","ts"}
//! ```

mod click;
mod event;
mod impression;
mod random;

pub use click::Click;
pub use event::{CLICKS, Event, IMPRESSIONS};
pub use impression::Impression;
pub use random::RandomSource;
