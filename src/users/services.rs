use std::sync::Arc;

use async_trait::async_trait;

use crate::users::entity::{NewUser, UserPatch, UserResponse};
use crate::users::repo::{RepoResult, UserRepository};

/// Application-level operations on users, sitting between the HTTP handlers
/// and the repository. Business rules (auditing, authorization) attach here.
#[async_trait]
pub trait UserUsecase: Send + Sync {
    async fn register_user(&self, user: NewUser) -> RepoResult<UserResponse>;
    async fn find_all_users(&self) -> RepoResult<Vec<UserResponse>>;
    async fn find_user_by_id(&self, id: i64) -> RepoResult<UserResponse>;
    async fn find_user_by_username(&self, username: &str) -> RepoResult<UserResponse>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<UserResponse>;
    async fn update_user(&self, id: i64, patch: UserPatch) -> RepoResult<UserResponse>;
    async fn delete_user(&self, id: i64) -> RepoResult<()>;
}

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UserUsecase for UserService {
    async fn register_user(&self, user: NewUser) -> RepoResult<UserResponse> {
        self.repository.create_user(user).await
    }

    async fn find_all_users(&self) -> RepoResult<Vec<UserResponse>> {
        self.repository.find_all_users().await
    }

    async fn find_user_by_id(&self, id: i64) -> RepoResult<UserResponse> {
        self.repository.find_user_by_id(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> RepoResult<UserResponse> {
        self.repository.find_user_by_username(username).await
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<UserResponse> {
        self.repository.find_user_by_email(email).await
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> RepoResult<UserResponse> {
        self.repository.update_user(id, patch).await
    }

    async fn delete_user(&self, id: i64) -> RepoResult<()> {
        self.repository.delete_user(id).await
    }
}
