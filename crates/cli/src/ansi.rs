//! Minimal ANSI color helpers, used only where a command highlights a
//! state (blocked/allowed/locked) in its own output.

pub const RED: &str = "\x1b[0;31m";
pub const GREEN: &str = "\x1b[0;32m";
pub const YELLOW: &str = "\x1b[0;33m";
pub const GRAY: &str = "\x1b[38;5;248m";
pub const RESET: &str = "\x1b[0m";

pub fn enabled() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn paint(color: &str, text: &str) -> String {
    if enabled() {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}
