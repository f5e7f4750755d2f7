pub mod content;
pub mod error;
pub mod filter;
pub mod id;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;

pub use error::{FlatstoreError, Result};
pub use filter::{Condition, QueryOption};
pub use query::Query;
pub use record::Record;
pub use schema::SchemaDefinition;
pub use store::Store;
