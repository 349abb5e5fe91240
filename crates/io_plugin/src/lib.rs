pub mod console;
pub mod loader;
pub mod message;
pub mod plugin;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_util;
