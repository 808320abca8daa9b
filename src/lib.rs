//! fxchat - real-time WebSocket chat hub
//!
//! Clients broadcast text to each other and may ask for recent EUR/USD
//! exchange rates, which are fetched and broadcast to everyone.

pub mod audit;
pub mod chat;
pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod server;

pub use audit::{AuditLogger, AuditRecord};
pub use chat::{
    parse_input, Broadcaster, ChatInput, ClientRegistry, CommandDispatcher, DeliveryError,
    DispatchOutcome, Outbound, Session, SessionId,
};
pub use config::Config;
pub use error::{FxChatError, Result};
pub use exchange::{
    CurrencyQuote, DayRates, FetchError, PrivatBankProvider, Rate, RateFetcher, RateProvider,
    RateSeries,
};
pub use server::{ChatServer, ChatState, LifecycleState, ServerLifecycle, ShutdownReason};
