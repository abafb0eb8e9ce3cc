pub mod extract;
pub mod password;
pub mod tokens;

pub use extract::AuthUser;
pub use tokens::{TokenClaims, TokenManager};
