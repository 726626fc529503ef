pub mod auth;
pub mod common;
pub mod department;
pub mod permission;
pub mod role;
pub mod user;
pub mod user_department;

pub use auth::*;
pub use common::*;
pub use department::*;
pub use permission::*;
pub use role::*;
pub use user::*;
pub use user_department::*;
