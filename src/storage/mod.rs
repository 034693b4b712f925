mod quotes;
mod schema;
mod slots;
mod types;

pub use quotes::QUOTES_SLOT;
pub use schema::Database;
pub use types::{CategoryFilter, DatabaseError, Quote};
