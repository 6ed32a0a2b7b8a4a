pub mod clock;
pub mod controller;
pub mod history;
pub(crate) mod loop_worker;

pub use clock::format_elapsed;
pub use controller::{SessionController, SessionEvent};
pub use history::HistoryBuffer;
