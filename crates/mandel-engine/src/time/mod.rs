//! Time subsystem.
//!
//! Frame timing is measured at GPU completion, not at CPU submission:
//! - the runtime timestamps each completion on the polling thread
//! - the application feeds timestamps to one `CompletionClock` on the UI thread

mod completion_clock;

pub use completion_clock::{CompletionClock, FrameSample};
