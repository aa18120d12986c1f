pub mod session;
pub mod variants;

pub use session::{PortraitSession, SessionState};
pub use variants::{SkippedVariant, VariantBatch, VariantGenerator};
