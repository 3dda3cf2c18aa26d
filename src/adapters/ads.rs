use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdBreak {
    pub id: Option<String>,
    pub schedule_time_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: Option<String>,
    pub duration_secs: Option<f64>,
    pub clickthrough_url: Option<String>,
}

/// Receives the ad lifecycle calls forwarded by the SDK adapter.
pub trait AdEventListener: Send + Sync {
    fn on_ad_break_started(&self, ad_break: &AdBreak);

    fn on_ad_break_finished(&self, ad_break: &AdBreak);

    fn on_ad_started(&self, ad: &Ad);

    fn on_ad_finished(&self, ad: &Ad);
}
