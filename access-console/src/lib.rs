pub mod config;
pub mod models;
pub mod services;
pub mod session;

use console_core::error::ApiResult;
use std::sync::Arc;

use crate::config::Settings;
use crate::services::{
    ApiClient, AuthClient, DepartmentClient, PermissionClient, RoleClient, UserClient,
    UserDepartmentClient,
};
use crate::session::{
    FileSessionStore, SessionManager, SessionOptions, SystemClock, TokioScheduler,
};

/// Session plus every backend collaborator, wired against one base URL.
///
/// Resource clients read the bearer token from the session on each call.
#[derive(Clone)]
pub struct AccessConsole {
    pub session: SessionManager,
    pub users: UserClient,
    pub roles: RoleClient,
    pub permissions: PermissionClient,
    pub departments: DepartmentClient,
    pub user_departments: UserDepartmentClient,
}

impl AccessConsole {
    pub fn build(settings: &Settings) -> ApiResult<Self> {
        let api = ApiClient::new(&settings.api)?;

        let session = SessionManager::new(
            Arc::new(AuthClient::new(api.clone())),
            Arc::new(FileSessionStore::new(&settings.session.store_path)),
            Arc::new(SystemClock),
            Arc::new(TokioScheduler::new()),
            SessionOptions::from(&settings.session),
        );

        Ok(Self::with_session(api, session))
    }

    /// Wire resource clients to an existing session.
    pub fn with_session(api: ApiClient, session: SessionManager) -> Self {
        let authorized = api.authorized_by(session.subscribe());
        Self {
            users: UserClient::new(authorized.clone()),
            roles: RoleClient::new(authorized.clone()),
            permissions: PermissionClient::new(authorized.clone()),
            departments: DepartmentClient::new(authorized.clone()),
            user_departments: UserDepartmentClient::new(authorized),
            session,
        }
    }
}
