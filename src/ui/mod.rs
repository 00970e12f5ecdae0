//! Session state, its update loop and the rendered views.

pub mod command;
pub mod runtime;
pub mod session;
pub mod view;

pub use command::Command;
pub use runtime::Runtime;
pub use session::{AnalysisState, Message, Session, SessionOptions};
pub use view::{render, ResultView, SessionView};
