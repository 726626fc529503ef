//! Session layer: clock, deferred tasks, persistence and the token lifecycle.

pub mod clock;
pub mod manager;
pub mod scheduler;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{AuthApi, AuthError, AuthState, SessionManager, SessionOptions, TokenGrant};
pub use scheduler::{DeferredTask, ManualScheduler, Scheduler, TaskHandle, TokioScheduler};
pub use store::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore, StoreError};
