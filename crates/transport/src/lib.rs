//! Transport adapters: a uniform poll/send/close surface over Console,
//! Signal, and Telegram backends (spec.md §6.2).

mod console;
mod signal;
mod telegram;
mod trait_def;

pub use console::ConsoleTransport;
pub use signal::SignalTransport;
pub use telegram::{sanitize_outbound, TelegramTransport};
pub use trait_def::Transport;
