//! Error macros for salience

/// Macro for rejecting an out-of-range configuration value
#[macro_export]
macro_rules! bail_config {
    ($field:expr, $reason:expr) => {
        return Err($crate::error::SalienceError::invalid_config(
            $field, $reason,
        ))
    };
}

/// Macro for creating usage errors
#[macro_export]
macro_rules! bail_usage {
    ($msg:expr) => {
        return Err($crate::error::SalienceError::UsageError($msg.to_string()))
    };
}

/// Macro for mapping IO errors with a path attached
#[macro_export]
macro_rules! map_io_err {
    ($op:expr, $path:expr, $error:expr) => {
        $crate::error::SalienceError::io_operation($op, $path.display(), $error)
    };
}
