/// A user about to be inserted. `password_hash` is already a PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub fullname: String,
}

/// Credential row used to authenticate a login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredential {
    pub id: String,
    pub password: String,
}
