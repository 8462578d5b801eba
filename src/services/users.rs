use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{FundError, FundResult};
use crate::models::{NewUser, User};
use crate::store::FundStore;

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 64;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn FundStore>,
    admins: Arc<HashSet<String>>,
}

impl UserService {
    pub fn new(store: Arc<dyn FundStore>, admin_usernames: impl IntoIterator<Item = String>) -> Self {
        let admins = admin_usernames
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self {
            store,
            admins: Arc::new(admins),
        }
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admins.contains(username.trim())
    }

    pub async fn register(&self, new_user: NewUser) -> FundResult<User> {
        let new_user = validate_new_user(new_user)?;
        let user = self.store.create_user(&new_user).await?;
        info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> FundResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or(FundError::NotFound { entity: "User", id })
    }

    pub async fn find_by_username(&self, username: &str) -> FundResult<Option<User>> {
        Ok(self.store.get_user_by_username(username.trim()).await?)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> FundResult<User> {
        match self.find_by_username(username).await? {
            Some(user) if user.password == password => Ok(user),
            _ => {
                debug!("Authentication failed for {}", username.trim());
                Err(FundError::Unauthorized)
            }
        }
    }

    /// Authenticates and requires the account to be a configured admin.
    pub async fn authorize_admin(&self, username: &str, password: &str) -> FundResult<User> {
        let user = self.authenticate(username, password).await?;
        if !self.is_admin(&user.username) {
            debug!("User {} is not an admin", user.username);
            return Err(FundError::Unauthorized);
        }
        Ok(user)
    }

    /// Returns the existing account with this username or registers it.
    pub async fn ensure_user(&self, new_user: NewUser) -> FundResult<User> {
        if let Some(existing) = self.find_by_username(&new_user.username).await? {
            return Ok(existing);
        }
        self.register(new_user).await
    }
}

fn validate_new_user(new_user: NewUser) -> FundResult<NewUser> {
    let username = new_user.username.trim();
    let length = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&length) {
        return Err(FundError::invalid_input(format!(
            "username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters"
        )));
    }
    if new_user.password.is_empty() {
        return Err(FundError::invalid_input("password cannot be empty"));
    }
    Ok(NewUser {
        username: username.to_string(),
        password: new_user.password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()), vec!["admin".to_string()])
    }

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_validates_and_rejects_taken_names() {
        let users = service();
        let created = users.register(new_user(" admin ", "s3cret")).await.unwrap();
        assert_eq!(created.username, "admin");

        let taken = users.register(new_user("admin", "other")).await.unwrap_err();
        assert_eq!(taken.kind(), ErrorKind::InvalidInput);
        let short = users.register(new_user("ab", "pw")).await.unwrap_err();
        assert_eq!(short.kind(), ErrorKind::InvalidInput);
        let blank = users.register(new_user("carol", "")).await.unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::InvalidInput);

        assert_eq!(users.get_user(created.id).await.unwrap(), created);
        assert_eq!(
            users.get_user(created.id + 1).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn admin_authorization_requires_credentials_and_role() {
        let users = service();
        users.register(new_user("admin", "s3cret")).await.unwrap();
        users.register(new_user("alice", "pw")).await.unwrap();

        assert!(users.authorize_admin("admin", "s3cret").await.is_ok());
        assert_eq!(
            users.authorize_admin("admin", "wrong").await.unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            users.authorize_admin("alice", "pw").await.unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            users.authenticate("nobody", "pw").await.unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert!(users.authenticate("alice", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let users = service();
        let first = users.ensure_user(new_user("admin", "s3cret")).await.unwrap();
        let second = users.ensure_user(new_user("admin", "changed")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.password, "s3cret");
    }
}
