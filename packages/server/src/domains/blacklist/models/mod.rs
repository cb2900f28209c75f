mod blacklist_entry;

pub use blacklist_entry::{BlacklistEntry, BlacklistStatus};
