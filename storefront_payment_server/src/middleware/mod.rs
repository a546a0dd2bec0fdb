mod admin_token;

pub use admin_token::{AdminToken, AdminTokenMiddlewareFactory, AdminTokenMiddlewareService, ADMIN_TOKEN_HEADER};
