pub mod session;

pub use session::{Completion, Session};
