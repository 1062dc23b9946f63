pub mod edge;
pub mod guard;
pub mod response;

pub use edge::{cookie_value, edge_gate_middleware, extract_session_token, SessionContext};
pub use guard::{component_gate_middleware, PageGuard};
pub use response::ApiResponse;
