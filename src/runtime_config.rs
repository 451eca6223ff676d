//! # Runtime Configuration
//!
//! Coroutine runtime settings read from the environment at startup.
//!
//! ## `RESX_STACK_SIZE`
//!
//! Stack size of each request coroutine. Accepts decimal (`16384`) or
//! hexadecimal (`0x4000`). Default: `0x4000` (16 KB).
//!
//! Service handlers run directly on the request coroutine, so components
//! with deep call chains or large locals need a bigger stack. Memory use is
//! roughly `stack_size × concurrent requests`.
//!
//! ```bash
//! export RESX_STACK_SIZE=0x8000
//! resx serve
//! ```

use std::env;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            stack_size: env::var("RESX_STACK_SIZE")
                .ok()
                .and_then(|v| parse_size(&v))
                .unwrap_or(DEFAULT_STACK_SIZE),
        }
    }

    /// Apply to the global `may` configuration.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
