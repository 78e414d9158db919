pub mod guards;

pub use actix_middleware::{CurrentUser, JwtAuthMiddleware};
pub use guards::{ensure_admin, ensure_member, ensure_self, ensure_trusted, ensure_visible_user};
