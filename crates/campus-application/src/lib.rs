//! Application layer for the campus admin client.
//!
//! [`UserStore`] caches what the [`campus_core::user::UserService`] returns
//! and guards against duplicate fetches; [`UserAdminUseCase`] runs the admin
//! flows on top of it.

pub mod request_state;
pub mod user_admin_usecase;
pub mod user_store;

pub use request_state::{FlightGuard, RequestState, RequestStates};
pub use user_admin_usecase::UserAdminUseCase;
pub use user_store::UserStore;
