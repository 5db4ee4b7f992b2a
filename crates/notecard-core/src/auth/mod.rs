//! Authentication state and token lifecycle shared by every front end.

mod context;
pub mod guard;
pub mod jwt;
mod store;
mod tokens;

pub use context::{AuthContext, TokenValidationTimer};
pub use guard::AuthPhase;
pub use store::{AuthStore, SubscriptionId};
pub use tokens::{MemoryTokenStorage, TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
