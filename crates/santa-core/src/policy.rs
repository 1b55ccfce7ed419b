//! Tunable rules for one event.

use serde::{Deserialize, Serialize};

/// Shortest accepted display name, in characters.
pub const DEFAULT_MIN_NAME_CHARS: usize = 5;

/// Delivery attempts per giver before a notification is reported as failed.
pub const DEFAULT_NOTIFY_MAX_ATTEMPTS: u32 = 3;

/// Pause before the second delivery attempt; doubles on each further attempt.
pub const DEFAULT_NOTIFY_RETRY_DELAY_MS: u64 = 500;

/// Rules applied by [`crate::SecretSanta`] to registration and notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPolicy {
  /// Names shorter than this are rejected as likely incomplete input.
  pub min_name_chars:                usize,
  /// Whether `register` is accepted while a distribution round is active.
  /// Late registrants stay unassigned until the next reset and run.
  pub allow_registration_after_draw: bool,
  pub notify_max_attempts:           u32,
  pub notify_retry_delay_ms:         u64,
}

impl Default for EventPolicy {
  fn default() -> Self {
    Self {
      min_name_chars:                DEFAULT_MIN_NAME_CHARS,
      allow_registration_after_draw: true,
      notify_max_attempts:           DEFAULT_NOTIFY_MAX_ATTEMPTS,
      notify_retry_delay_ms:         DEFAULT_NOTIFY_RETRY_DELAY_MS,
    }
  }
}
