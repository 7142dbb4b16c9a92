pub mod requests;
pub mod responses;

pub use requests::{ClaimBlockRequest, ClientMessage, SignInRequest};
pub use responses::{
    ClaimResponse, ErrorResponse, ServerMessage, SessionResponse, StatsResponse,
};
