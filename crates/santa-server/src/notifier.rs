//! The server's stand-in delivery channel: each notification becomes a log
//! line. A chat integration replaces this with a real transport.

use std::convert::Infallible;

use santa_core::{event::Recipient, notify::Notifier, participant::Participant};

pub struct LogNotifier;

impl Notifier for LogNotifier {
  type Error = Infallible;

  async fn deliver(&self, giver: &Participant, recipient: &Recipient) -> Result<(), Infallible> {
    tracing::info!(
      giver = %giver.participant_id,
      receiver = %recipient.participant_id,
      receiver_name = %recipient.profile.name,
      "assignment delivered"
    );
    Ok(())
  }
}
