use serde::{Deserialize, Serialize};

use crate::error::SerializationError;
use crate::model::event::{CLICKS, Event};
use crate::model::impression::Impression;

/// A user interacting with a previously shown [`Impression`].
///
/// `impr_id` and `user_id` always equal those of the originating impression;
/// [`Click::for_impression`] is the only way the generator builds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Click {
    /// Click identifier (`click-XXXXXXXX`).
    pub click_id: String,
    /// Impression this click follows.
    pub impr_id: String,
    /// User who saw the impression.
    pub user_id: String,
    /// Emission time, milliseconds since the Unix epoch.
    #[serde(rename = "ts")]
    pub timestamp_ms: i64,
}

impl Click {
    /// Builds a click causally linked to `impression`.
    pub fn for_impression(impression: &Impression, click_id: String, timestamp_ms: i64) -> Self {
        Self {
            click_id,
            impr_id: impression.impr_id.clone(),
            user_id: impression.user_id.clone(),
            timestamp_ms,
        }
    }
}

impl Event for Click {
    fn identity_key(&self) -> &[u8] {
        self.click_id.as_bytes()
    }

    fn destination(&self) -> &str {
        CLICKS
    }

    fn payload(&self) -> Result<Vec<u8>, SerializationError> {
        Ok(serde_json::to_vec(self)?)
    }
}
