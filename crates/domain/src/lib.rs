pub mod credentials;
pub mod directory;
pub mod error;
pub mod filter;
pub mod types;

pub use credentials::{AuthResult, CredentialStore};
pub use directory::{Deadline, Directory, find_first_match};
pub use error::{DomainError, TimeLimitExceeded};
pub use filter::{Filter, UnsupportedFilterPolicy};
pub use types::{AttributeMap, AttributeValue, Credential, DirectoryEntry};
