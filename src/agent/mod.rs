pub mod dispatch;
pub mod relay;

pub use dispatch::dispatch_function_call;
pub use relay::{Relay, RelayError, TurnOutcome};
