use serde::{Deserialize, Serialize};

use crate::error::SerializationError;
use crate::model::event::{Event, IMPRESSIONS};
use crate::model::random::RandomSource;

/// An ad shown to a user.
///
/// Immutable once built; the generator hands it to the publisher and, at most once,
/// to a delayed click task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impression {
    /// Impression identifier (`impr-XXXXXXXX`).
    pub impr_id: String,
    /// Identifier of the user the ad was shown to.
    pub user_id: String,
    /// Campaign the ad belongs to.
    pub campaign_id: String,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(rename = "ts")]
    pub timestamp_ms: i64,
}

impl Impression {
    /// Builds an impression with fresh random identifiers and a campaign drawn uniformly
    /// from `campaigns`.
    ///
    /// Returns `None` only when `campaigns` is empty.
    pub fn generate(
        random: &RandomSource,
        campaigns: &[String],
        id_len: usize,
        user_id_len: usize,
        timestamp_ms: i64,
    ) -> Option<Self> {
        let campaign_id = random.choose(campaigns)?.clone();
        Some(Self {
            impr_id: random.id("impr", id_len),
            user_id: random.id("user", user_id_len),
            campaign_id,
            timestamp_ms,
        })
    }
}

impl Event for Impression {
    fn identity_key(&self) -> &[u8] {
        self.impr_id.as_bytes()
    }

    fn destination(&self) -> &str {
        IMPRESSIONS
    }

    fn payload(&self) -> Result<Vec<u8>, SerializationError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn campaigns() -> Vec<String> {
        vec!["campaign-1".into(), "campaign-2".into(), "campaign-3".into()]
    }

    #[test]
    fn generated_impression_maps_to_event_contract() {
        let random = RandomSource::seeded(7);
        let imp = Impression::generate(&random, &campaigns(), 8, 6, 1_700_000_000_000).unwrap();

        assert!(!imp.identity_key().is_empty());
        assert_eq!(imp.identity_key(), imp.impr_id.as_bytes());
        assert_eq!(imp.destination(), "impressions");
        assert!(imp.impr_id.starts_with("impr-"));
        assert_eq!(imp.impr_id.len(), "impr-".len() + 8);
        assert!(imp.user_id.starts_with("user-"));
        assert_eq!(imp.user_id.len(), "user-".len() + 6);
        assert!(campaigns().contains(&imp.campaign_id));
    }

    #[test]
    fn payload_uses_wire_field_names() {
        let imp = Impression {
            impr_id: "impr-abc".into(),
            user_id: "user-xyz".into(),
            campaign_id: "campaign-2".into(),
            timestamp_ms: 42,
        };
        let v: Value = serde_json::from_slice(&imp.payload().unwrap()).unwrap();

        assert_eq!(v["impr_id"], "impr-abc");
        assert_eq!(v["user_id"], "user-xyz");
        assert_eq!(v["campaign_id"], "campaign-2");
        assert_eq!(v["ts"], 42);
        assert_eq!(v.as_object().unwrap().len(), 4);
    }

    #[test]
    fn empty_campaign_list_yields_nothing() {
        let random = RandomSource::seeded(1);
        assert!(Impression::generate(&random, &[], 8, 6, 0).is_none());
    }
}
