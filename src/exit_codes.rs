//! Process exit codes used by the command-line front end

/// Everything went fine, or there was nothing to wrap
pub const SUCCESS: i32 = 0;

/// `check` found lines that would be wrapped
pub const VIOLATIONS_FOUND: i32 = 1;

/// Configuration, I/O or usage error
pub const TOOL_ERROR: i32 = 2;

pub mod exit {
    use super::*;

    pub fn success() -> ! {
        std::process::exit(SUCCESS);
    }

    pub fn violations_found() -> ! {
        std::process::exit(VIOLATIONS_FOUND);
    }

    pub fn tool_error() -> ! {
        std::process::exit(TOOL_ERROR);
    }
}
