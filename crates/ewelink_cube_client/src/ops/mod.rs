//! Bridge operations, one module per capability group. Every operation is
//! generic over [`Transport`](crate::client::Transport).

pub mod access_token;
pub mod bridge;
pub mod device;
pub mod hardware;
pub mod thirdparty;

pub use access_token::{acquire_access_token, AccessTokenOptions};
