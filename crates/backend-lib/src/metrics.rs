// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const LOGIN_LOCKED_OUT: &str = "auth.login.locked_out";
pub const TOKEN_ISSUED: &str = "auth.token.issued";
pub const TOKEN_REJECTED: &str = "auth.token.rejected";
pub const USER_REGISTERED: &str = "user.registered";
pub const USER_DELETED: &str = "user.deleted";
