pub use apex_error::{describe_exit, HalError, HalResult};
