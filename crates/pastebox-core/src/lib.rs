//! Paste lifecycle: identifier allocation, expiration, access checks and
//! burn-after-read, plus the user registration and login flow that
//! attributes pastes to owners.

pub mod clock;
pub mod error;
pub mod expiration;
pub mod ids;
pub mod lifecycle;
pub mod users;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, PasteError};
pub use expiration::Expiration;
pub use ids::{IdAllocator, IdSource};
pub use lifecycle::{PasteForm, PasteService};
pub use users::{Registration, UserService};
