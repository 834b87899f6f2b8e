/// All timestamps are UTC and serialize as RFC 3339.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
