use crate::models::{AuthUser, UserAccount};
use tracing::{info, warn};

/// Plain credential check against the configured accounts.
pub fn authenticate(users: &[UserAccount], username: &str, password: &str) -> Option<AuthUser> {
    let username = username.trim();
    match users
        .iter()
        .find(|u| u.username == username && u.password == password)
    {
        Some(account) => {
            info!("User {} signed in", account.username);
            Some(AuthUser {
                username: account.username.clone(),
                name: account.name.clone(),
            })
        }
        None => {
            warn!("Rejected sign-in attempt for {:?}", username);
            None
        }
    }
}
