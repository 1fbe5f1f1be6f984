//! App-side access to the HabitCoach API.
//!
//! [`Dispatcher`] throttles, bounds and cancels requests before they reach
//! the network; [`Transport`] is the seam to the gateway, with
//! [`HttpTransport`] as the production implementation.

pub mod dispatcher;
pub mod error;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use transport::{CoachReply, CoachRequest, HttpTransport, Transport, decode_response};
