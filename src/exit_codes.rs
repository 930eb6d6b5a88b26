/// Process exit codes.
pub const SUCCESS: u8 = 0;
pub const CONFIG_ERROR: u8 = 2;
pub const RUN_FAILED: u8 = 3;
pub const RUNTIME_ERROR: u8 = 4;
