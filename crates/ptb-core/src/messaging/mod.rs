//! Outbound chat messaging abstraction (Telegram today).

pub mod port;
