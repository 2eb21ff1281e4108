// Worker state machine
//
// Each worker owns one WorkerState and one IdentityTable. Both change only
// through `dispatch::apply`, driven by events drained from the control bus,
// plus the worker's own blocked flag set right after it produces output.

pub mod dispatch;
pub mod identity;
pub mod states;

pub use dispatch::{apply, Transition};
pub use identity::IdentityTable;
pub use states::{WorkerPhase, WorkerState};
