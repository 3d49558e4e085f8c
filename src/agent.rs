//! Main agent loop.
//!
//! Consumes the channel's event stream, resolves the per-user session, and
//! dispatches each event to the dialogue machine. Every event is handled in
//! its own task so a slow generation call for one user never blocks the
//! others; the per-session mutex keeps events for the same user in order.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::channels::{Channel, EventKind, IncomingEvent, RenderDirective};
use crate::config::BotConfig;
use crate::dialogue::machine::page_directive;
use crate::dialogue::{ChoiceToken, DialogueMachine, MachineOutcome, SessionStore};
use crate::error::Error;
use crate::llm::GenerationClient;
use crate::plan::{parse_plan_response, prompts};
use crate::profile::Profile;

/// The agent: one channel, one dialogue machine, one generation client.
pub struct Agent {
    channel: Arc<dyn Channel>,
    machine: Arc<DialogueMachine>,
    llm: Arc<dyn GenerationClient>,
    sessions: Arc<SessionStore>,
    session_idle_timeout: Duration,
}

impl Agent {
    pub fn new(
        config: &BotConfig,
        channel: Arc<dyn Channel>,
        machine: DialogueMachine,
        llm: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            channel,
            machine: Arc::new(machine),
            llm,
            sessions: Arc::new(SessionStore::new()),
            session_idle_timeout: config.session_idle_timeout,
        }
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run until the stream ends or Ctrl+C.
    pub async fn run(self) -> Result<(), Error> {
        let mut events = self.channel.start().await.map_err(Error::from)?;

        // Spawn session pruning task
        let sessions = Arc::clone(&self.sessions);
        let idle_timeout = self.session_idle_timeout;
        let pruning_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(600));
            interval.tick().await; // Skip immediate first tick
            loop {
                interval.tick().await;
                sessions.prune_stale(idle_timeout).await;
            }
        });

        tracing::info!(
            channel = self.channel.name(),
            model = self.llm.model_name(),
            "Agent ready and listening"
        );

        loop {
            let event = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                event = events.next() => {
                    match event {
                        Some(e) => e,
                        None => {
                            tracing::info!("Event stream ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            let channel = Arc::clone(&self.channel);
            let machine = Arc::clone(&self.machine);
            let llm = Arc::clone(&self.llm);
            let sessions = Arc::clone(&self.sessions);
            tokio::spawn(async move {
                if let Err(e) = handle_event(&event, channel, machine, llm, sessions).await {
                    tracing::error!(user_id = %event.user_id, error = %e, "Error handling event");
                }
            });
        }

        pruning_handle.abort();
        self.channel.shutdown().await.map_err(Error::from)?;
        Ok(())
    }
}

// ── Event dispatch ──────────────────────────────────────────────────

async fn handle_event(
    event: &IncomingEvent,
    channel: Arc<dyn Channel>,
    machine: Arc<DialogueMachine>,
    llm: Arc<dyn GenerationClient>,
    sessions: Arc<SessionStore>,
) -> Result<(), Error> {
    let session = sessions.get_or_create(&event.user_id).await;

    let outcome = {
        let mut session = session.lock().await;
        session.touch();
        match &event.kind {
            EventKind::Text(text) => {
                MachineOutcome::Replies(machine.handle_text(&mut session, text).await)
            }
            EventKind::Button(token) => match token.parse::<ChoiceToken>() {
                Ok(choice) => machine.handle_choice(&mut session, choice).await,
                Err(e) => {
                    // Unknown wire token: dropped at the edge.
                    tracing::debug!(user_id = %event.user_id, error = %e, "Dropping event");
                    return Ok(());
                }
            },
        }
    };

    match outcome {
        MachineOutcome::Replies(directives) => {
            for directive in directives {
                channel.respond(event, directive).await?;
            }
        }
        MachineOutcome::StartGeneration {
            profile,
            daily_calories,
            epoch,
            notice,
        } => {
            channel.respond(event, notice).await?;
            run_generation(event, &channel, &llm, &session, profile, daily_calories, epoch)
                .await?;
        }
    }

    Ok(())
}

// ── Plan generation ─────────────────────────────────────────────────

/// Call the generation service outside the session lock and load the
/// resulting plan into the pager.
///
/// `epoch` was captured under the session lock by the transition that
/// produced the generation request; if the user reset the session any time
/// after that, the stale result is discarded without touching the session.
async fn run_generation(
    event: &IncomingEvent,
    channel: &Arc<dyn Channel>,
    llm: &Arc<dyn GenerationClient>,
    session: &Arc<tokio::sync::Mutex<crate::dialogue::Session>>,
    profile: Profile,
    daily_calories: u32,
    epoch: u64,
) -> Result<(), Error> {
    channel.notify_busy(event).await;

    let started = std::time::Instant::now();
    let plan = match llm
        .complete(
            prompts::system_instructions(),
            &prompts::plan_request(&profile, daily_calories),
        )
        .await
        .and_then(|raw| parse_plan_response(&raw))
    {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!(user_id = %event.user_id, error = %e, "Plan generation failed");
            channel
                .respond(
                    event,
                    RenderDirective::text(
                        "😔 I couldn't create your menu just now. Please try again in a minute.",
                    ),
                )
                .await?;
            return Ok(());
        }
    };

    tracing::info!(
        user_id = %event.user_id,
        days = plan.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Plan generated"
    );

    let mut session = session.lock().await;
    if session.epoch != epoch {
        tracing::info!(user_id = %event.user_id, "Session reset during generation, discarding plan");
        return Ok(());
    }

    session.pager.load(plan).map_err(Error::from)?;
    let directive = page_directive(&session.pager).map_err(Error::from)?;
    drop(session);

    channel.respond(event, directive).await?;
    Ok(())
}
