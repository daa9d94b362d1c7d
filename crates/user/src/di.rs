use crate::{
    abstract_trait::{media::DynMediaUploader, user::service::DynUserCommandService},
    repository::{command::UserCommandRepository, query::UserQueryRepository},
    service::command::{UserCommandService, UserCommandServiceDeps},
};
use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use shared::{abstract_trait::DynHashing, config::ConnectionPool};
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct DependenciesInjectDeps {
    pub pool: ConnectionPool,
    pub hash: DynHashing,
    pub media: DynMediaUploader,
}

#[derive(Clone)]
pub struct DependenciesInject {
    pub user_command: DynUserCommandService,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("user_command", &"DynUserCommandService")
            .finish()
    }
}

impl DependenciesInject {
    pub fn new(deps: DependenciesInjectDeps, registry: &mut Registry) -> Result<Self> {
        let DependenciesInjectDeps { pool, hash, media } = deps;

        let user_query_repo = Arc::new(UserQueryRepository::new(pool.clone()));
        let user_command_repo = Arc::new(UserCommandRepository::new(pool));

        let user_command_deps = UserCommandServiceDeps {
            hash,
            media,
            query: user_query_repo,
            command: user_command_repo,
        };

        let user_command = Arc::new(
            UserCommandService::new(user_command_deps, registry)
                .context("failed initialize user command")?,
        ) as DynUserCommandService;

        Ok(Self { user_command })
    }
}
