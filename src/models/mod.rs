pub mod file;
pub mod form;
pub mod group;
pub mod handler;
pub mod submission;

pub use file::{FileStatus, ManagedFile, NewFile};
pub use form::{Form, FormSettings};
pub use group::ContactGroup;
pub use handler::Handler;
pub use submission::Submission;
