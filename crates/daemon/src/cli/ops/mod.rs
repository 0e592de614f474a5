pub mod daemon;
pub mod health;
pub mod init;
pub mod nonce;
pub mod secret;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use secret::Secret;
pub use version::Version;
