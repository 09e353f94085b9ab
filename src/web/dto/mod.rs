//! Data Transfer Objects for the web API.

pub mod request;
pub mod response;

pub use request::{DownloadQuery, EntryKindParam, MediaQuery, TreeQuery};
pub use response::{ActionResponse, ApiResponse, Limits, TreeResponse};
