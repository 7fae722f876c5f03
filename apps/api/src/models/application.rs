use serde::{Deserialize, Serialize};

/// One submitted candidate record, in the wire shape accepted (and echoed
/// back) by the screening endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    /// Display only, never scored.
    pub name: String,
    /// Display only, never scored.
    pub age: String,
    /// Target job id.
    pub jid: i64,
    pub job_application: ApplicationDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    pub notice_period: i32,
    #[serde(default)]
    pub location: Vec<i64>,
    #[serde(default)]
    pub technology_stack: Vec<i64>,
    pub experience: i32,
    #[serde(default)]
    pub qualifications: Vec<i64>,
    #[serde(default)]
    pub shifts: Vec<i64>,
    #[serde(default)]
    pub jobtype: Vec<i64>,
}
