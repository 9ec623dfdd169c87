//! Token storage adapters.
//!
//! `FileTokenStorage` is the persistent local store, `CookieJarTokenStorage`
//! mirrors tokens into the cookies sent with every request, and
//! `MemoryTokenStorage` backs tests and throwaway sessions.

mod cookie_jar;
mod file;
mod memory;

pub use cookie_jar::{CookieJarTokenStorage, CookiePolicy};
pub use file::FileTokenStorage;
pub use memory::MemoryTokenStorage;
