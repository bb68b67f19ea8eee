pub(crate) mod bind;
pub(crate) mod core;
pub mod filter;
pub(crate) mod handler;
pub(crate) mod search;

pub use core::{error::LdapError, utils::LdapInfo};
pub use filter::convert_filter;
pub use handler::LdapHandler;
