//! External service clients: Supabase (accounts and checkpoints), OneSignal
//! (push delivery) and Telegram (operator escalation). Each implements the
//! matching seam from `lendwatch-core`.

mod onesignal;
mod supabase;
mod telegram;

pub use onesignal::{PushDispatcher, PushGateway, HEALTH_ALERT_COOLDOWN_HOURS};
pub use supabase::{PushTarget, Subscription, SupabaseClient};
pub use telegram::TelegramAlerts;
