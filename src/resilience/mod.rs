pub mod classifier;
pub mod credentials;
pub mod retry;

pub use classifier::{classify, classify_message, RemoteFailure};
pub use credentials::{CredentialProvider, SessionCredentials};
pub use retry::{RetryController, RetryPolicy};
