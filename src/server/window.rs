//! # Voting Window Controller
//!
//! Single-shot timer: sleeps for the window's duration, then closes the
//! window under the shared guard and reports the outcome. Nothing re-arms it.

use log::{info, warn};
use tokio::task::JoinHandle;

use crate::server::state::SharedState;
use crate::server::tally::Outcome;

pub struct WindowController {
    state: SharedState,
}

impl WindowController {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the timer on its own task. The handle resolves to the outcome, or
    /// `None` if something else had already closed the window.
    pub fn spawn(self) -> JoinHandle<Option<Outcome>> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) -> Option<Outcome> {
        let duration = self.state.lock().await.window().duration();
        info!(
            "⏰ Voting window open for {} seconds",
            duration.as_secs_f64()
        );
        tokio::time::sleep(duration).await;

        let outcome = self.state.lock().await.close_window();

        match &outcome {
            Some(outcome) => {
                info!("🗳️  Voting closed");
                for line in outcome.to_string().lines() {
                    info!("{}", line);
                }
            }
            None => warn!("⚠️  Voting window was already closed when the timer fired"),
        }

        outcome
    }
}
