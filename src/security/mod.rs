//! Privilege detection and input validation

pub mod privileges;
pub mod validator;

pub use privileges::{is_elevated, PrivilegeLevel};
