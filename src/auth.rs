//! Auth-domain identifiers, scope sets, secrets, and WebID helpers.

pub mod id;
pub mod scope;
pub mod secret;
pub mod webid;

pub use id::*;
pub use scope::*;
pub use secret::*;
pub use webid::*;
