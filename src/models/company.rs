use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub cash: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Company {
    pub id: u64,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub cash: i64,
    #[serde(default)]
    pub alliance_id: Option<u64>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// The `user` block most game responses carry next to `data`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserSnapshot {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub cash: Option<i64>,
}
