use serde::{Deserialize, Serialize};

pub const ALLOWED_DURATIONS: [i32; 4] = [30, 45, 60, 120];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRef {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub user_id: i64,
    pub name: String,
    pub duration_minutes: i32,
    pub price: String,
    pub description: Option<String>,
}
