//! Interactive read-eval loop over a [`NamespaceTree`](crate::namespace::NamespaceTree).

mod command;
mod session;

pub use command::is_addressable_name;
pub use session::{Session, SessionError, SessionOptions};
