pub mod codes;
pub mod envelope;
pub mod requests;
pub mod responses;

pub use codes::{DiscoveryErrorCode, KnownCode, ResponseCode};
pub use envelope::{EnvelopeError, ResponseEnvelope};
pub use requests::*;
pub use responses::*;
