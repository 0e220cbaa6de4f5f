pub mod alert;
pub mod message;
pub mod session;

pub use alert::{Alert, AlertCondition, Direction};
pub use message::{Action, OutboundMessage, Payload, Reply};
pub use session::{AlertKind, Draft, Session, Step};
