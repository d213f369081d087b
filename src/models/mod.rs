mod artifact;
mod evidence;
mod session;

pub use artifact::{CaptureArtifact, SessionSnapshot};
pub use evidence::{EvidenceRecord, TrustReport, TrustVerdict};
pub use session::{generate_token, Location, SessionContext, TOKEN_LEN};
