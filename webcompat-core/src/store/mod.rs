pub mod schema;
pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteIssueStore;
pub use traits::IssueStore;
