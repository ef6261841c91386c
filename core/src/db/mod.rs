use std::{fs, fs::File, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};

use self::{
    canvas_repo::CanvasRepositoryRef,
    chat_repo::ChatRepositoryRef,
    sqlite::{
        canvas_repo::SqliteCanvasRepository, chat_repo::SqliteChatRepository,
        connection as sqlite_connection, user_repo::SqliteUserRepository,
        voice_repo::SqliteVoiceRepository, workspace_repo::SqliteWorkspaceRepository,
    },
    user_repo::UserRepositoryRef,
    voice_repo::VoiceRepositoryRef,
    workspace_repo::WorkspaceRepositoryRef,
};
use crate::config::AppConfig;

pub mod canvas_repo;
pub mod chat_repo;
pub mod errors;
pub mod sqlite;
pub mod user_repo;
pub mod voice_repo;
pub mod workspace_repo;

#[derive(Clone)]
pub struct RepositoryRegistry {
    user_repo: UserRepositoryRef,
    workspace_repo: WorkspaceRepositoryRef,
    voice_repo: VoiceRepositoryRef,
    canvas_repo: CanvasRepositoryRef,
    chat_repo: ChatRepositoryRef,
}

impl RepositoryRegistry {
    pub fn new(
        user_repo: UserRepositoryRef,
        workspace_repo: WorkspaceRepositoryRef,
        voice_repo: VoiceRepositoryRef,
        canvas_repo: CanvasRepositoryRef,
        chat_repo: ChatRepositoryRef,
    ) -> Self {
        Self {
            user_repo,
            workspace_repo,
            voice_repo,
            canvas_repo,
            chat_repo,
        }
    }

    pub fn user_repo(&self) -> UserRepositoryRef {
        self.user_repo.clone()
    }

    pub fn workspace_repo(&self) -> WorkspaceRepositoryRef {
        self.workspace_repo.clone()
    }

    pub fn voice_repo(&self) -> VoiceRepositoryRef {
        self.voice_repo.clone()
    }

    pub fn canvas_repo(&self) -> CanvasRepositoryRef {
        self.canvas_repo.clone()
    }

    pub fn chat_repo(&self) -> ChatRepositoryRef {
        self.chat_repo.clone()
    }
}

#[derive(Clone)]
pub struct Database {
    pool: sqlite_connection::SqlitePool,
    path: PathBuf,
    repositories: Arc<RepositoryRegistry>,
}

impl Database {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let db_file = Self::resolve_db_path(&config.database_path)?;
        if let Some(parent) = db_file.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory: {}", parent.display())
            })?;
        }

        if !db_file.exists() {
            File::create(&db_file).with_context(|| {
                format!("failed to create database file: {}", db_file.display())
            })?;
        }

        let pool =
            sqlite_connection::create_pool(&db_file, config.database_max_connections).await?;
        sqlite_connection::run_migrations(&pool).await?;

        let user_repo = Arc::new(SqliteUserRepository::new(pool.clone())) as UserRepositoryRef;
        let workspace_repo =
            Arc::new(SqliteWorkspaceRepository::new(pool.clone())) as WorkspaceRepositoryRef;
        let voice_repo = Arc::new(SqliteVoiceRepository::new(pool.clone())) as VoiceRepositoryRef;
        let canvas_repo =
            Arc::new(SqliteCanvasRepository::new(pool.clone())) as CanvasRepositoryRef;
        let chat_repo = Arc::new(SqliteChatRepository::new(pool.clone())) as ChatRepositoryRef;

        let repositories = Arc::new(RepositoryRegistry::new(
            user_repo,
            workspace_repo,
            voice_repo,
            canvas_repo,
            chat_repo,
        ));

        Ok(Self {
            pool,
            path: db_file,
            repositories,
        })
    }

    pub fn pool(&self) -> &sqlite_connection::SqlitePool {
        &self.pool
    }

    pub fn database_path(&self) -> &PathBuf {
        &self.path
    }

    pub fn repositories(&self) -> Arc<RepositoryRegistry> {
        self.repositories.clone()
    }

    fn resolve_db_path(path: &str) -> Result<PathBuf> {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            Ok(path)
        } else {
            let cwd = std::env::current_dir().context("failed to obtain current directory")?;
            Ok(cwd.join(path))
        }
    }
}
