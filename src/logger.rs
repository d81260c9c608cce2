//! Console output for the CLI.
//!
//! Five channels: `info` (blue), `success` (green) and `plain` go to stdout;
//! `error` (red) and `warning` go to stderr. Everything but `plain` carries a
//! `[LEVEL]` prefix and is muted by [`set_silent`]. Use the `info!`,
//! `success!`, `warning!`, `error!` and `plain!` macros.

use colored::{Color, Colorize};
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

static SILENT: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Info,
    Error,
    Warning,
    Success,
    Plain,
}

impl Channel {
    fn prefix(self) -> Option<&'static str> {
        match self {
            Channel::Info => Some("INFO"),
            Channel::Error => Some("ERROR"),
            Channel::Warning => Some("WARNING"),
            Channel::Success => Some("SUCCESS"),
            Channel::Plain => None,
        }
    }

    fn color(self) -> Option<Color> {
        match self {
            Channel::Info => Some(Color::Blue),
            Channel::Error => Some(Color::Red),
            Channel::Success => Some(Color::Green),
            Channel::Warning | Channel::Plain => None,
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Channel::Error | Channel::Warning)
    }
}

/// Mute every channel except `plain`.
pub fn set_silent(silent: bool) {
    SILENT.store(silent, Ordering::Relaxed);
}

pub fn is_silent() -> bool {
    SILENT.load(Ordering::Relaxed)
}

#[doc(hidden)]
pub fn log(channel: Channel, args: fmt::Arguments<'_>) {
    if channel != Channel::Plain && is_silent() {
        return;
    }
    // Write failures (closed pipe) are ignored.
    let _ = if channel.to_stderr() {
        write_line(&mut io::stderr().lock(), channel, args)
    } else {
        write_line(&mut io::stdout().lock(), channel, args)
    };
}

/// Format one line for `channel` into `w`.
pub fn write_line<W: Write>(w: &mut W, channel: Channel, args: fmt::Arguments<'_>) -> io::Result<()> {
    let message = match channel.prefix() {
        Some(prefix) => format!("[{prefix}] {args}"),
        None => args.to_string(),
    };
    match channel.color() {
        Some(color) => writeln!(w, "{}", message.color(color)),
        None => writeln!(w, "{message}"),
    }
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Channel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Channel::Error, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Channel::Warning, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Channel::Success, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! plain {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Channel::Plain, format_args!($($arg)*))
    };
}
