pub mod authentications;
pub mod exports;
pub mod playlists;
pub mod users;

pub use authentications::{AuthenticationFlow, CredentialVerifier, RefreshTokenLedger, TokenPair};
pub use exports::{ExportRequest, ExportService};
pub use playlists::{CollaborationOracle, PlaylistRepository, PlaylistService};
pub use users::{UserDirectory, UserRegistry};
