pub mod response;
pub mod routes;

pub use response::{ApiResponse, Envelope};
pub use routes::create_router;
