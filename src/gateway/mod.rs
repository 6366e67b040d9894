//! Resilient access to external data: source fallback, bearer tokens and the
//! error taxonomy shared by every tool.

mod error;
mod orchestrator;
mod token;
mod upstream;

pub use error::{ErrorCode, GatewayError, SourceFailure};
pub use orchestrator::Orchestrator;
pub use token::{Authenticator, IamAuthenticator, TokenManager};
pub use upstream::{ensure_success, SourceError, UpstreamSource};

pub(crate) use upstream::truncate_chars;
