//! OmniChat adapters — capability providers for external services.
//!
//! Each adapter implements `omnichat_core::ToolAdapter` and exposes a
//! static `descriptor()` used to seed the tool catalog without
//! constructing the adapter (construction needs credentials).

pub mod auth;
pub mod calendar;
pub mod gmail;

pub use calendar::CalendarAdapter;
pub use gmail::GmailAdapter;
