//! Dialogue state machine — validates each input, advances the collection
//! flow, and produces render directives for the transport.
//!
//! The machine mutates a locked `Session` and returns what to render; it
//! never talks to a channel itself. The one long-running operation (plan
//! generation) is not performed here — the machine hands the caller a
//! `StartGeneration` outcome so the session lock can be released for the
//! duration of the call.

use std::sync::Arc;

use crate::channels::{Button, RenderDirective};
use crate::dialogue::session::Session;
use crate::dialogue::state::DialogueState;
use crate::dialogue::token::ChoiceToken;
use crate::dialogue::validate::{parse_age, parse_height, parse_weight};
use crate::error::PlanError;
use crate::plan::PlanPager;
use crate::profile::calories::{activity_multiplier, basal_metabolic_rate};
use crate::profile::{ActivityLevel, DraftProfile, Goal, Profile, Sex, compute_daily_calories};
use crate::store::ProfileStore;

/// What the caller should do after an event was processed.
#[derive(Debug)]
pub enum MachineOutcome {
    /// Deliver these directives and be done.
    Replies(Vec<RenderDirective>),
    /// Deliver `notice`, then run the generation call outside the session
    /// lock and apply the result only if the session epoch still equals
    /// `epoch`. The epoch is captured here, under the same lock as the
    /// transition, so a restart processed before the generation task
    /// re-acquires the session cannot slip a stale plan through.
    StartGeneration {
        profile: Profile,
        daily_calories: u32,
        epoch: u64,
        notice: RenderDirective,
    },
}

impl MachineOutcome {
    fn reply(directive: RenderDirective) -> Self {
        Self::Replies(vec![directive])
    }
}

/// Per-session finite-state controller for profile collection.
pub struct DialogueMachine {
    store: Arc<dyn ProfileStore>,
}

impl DialogueMachine {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    // ── Text events ─────────────────────────────────────────────────

    /// Process raw user text. Only the three numeric-collection states
    /// consume text; everywhere else text is inert and answered with menu
    /// guidance so stray input never lands in an unrelated field.
    pub async fn handle_text(&self, session: &mut Session, text: &str) -> Vec<RenderDirective> {
        let text = text.trim();

        if text == "/start" {
            session.reset();
            return vec![
                RenderDirective::text("Hi! I'm your nutrition assistant. 🥗"),
                main_menu_directive(),
            ];
        }

        match session.state {
            DialogueState::AwaitingWeight => match parse_weight(text) {
                Ok(weight) => {
                    session.draft.weight_kg = Some(weight);
                    session.state = DialogueState::AwaitingHeight;
                    vec![RenderDirective::text(
                        "Now your height in cm (e.g. 175):",
                    )]
                }
                Err(failure) => vec![RenderDirective::text(failure.prompt())],
            },
            DialogueState::AwaitingHeight => match parse_height(text) {
                Ok(height) => {
                    session.draft.height_cm = Some(height);
                    session.state = DialogueState::AwaitingAge;
                    vec![RenderDirective::text("And your age in years:")]
                }
                Err(failure) => vec![RenderDirective::text(failure.prompt())],
            },
            DialogueState::AwaitingAge => match parse_age(text) {
                Ok(age) => {
                    session.draft.age_years = Some(age);
                    session.state = DialogueState::AwaitingActivity;
                    vec![activity_directive()]
                }
                Err(failure) => vec![RenderDirective::text(failure.prompt())],
            },
            _ => vec![guidance_directive()],
        }
    }

    // ── Choice events ───────────────────────────────────────────────

    /// Process a button press. Choice tokens arriving in a state that does
    /// not expect them (stale or duplicated presses) are inert.
    pub async fn handle_choice(
        &self,
        session: &mut Session,
        token: ChoiceToken,
    ) -> MachineOutcome {
        match token {
            ChoiceToken::MainMenu => {
                session.reset();
                MachineOutcome::reply(main_menu_directive().edited())
            }
            ChoiceToken::StartProfile => {
                session.begin_collection();
                MachineOutcome::reply(sex_directive().edited())
            }
            ChoiceToken::Noop => MachineOutcome::Replies(Vec::new()),

            ChoiceToken::Sex(sex) if session.state == DialogueState::AwaitingSex => {
                session.draft.sex = Some(sex);
                session.state = DialogueState::AwaitingWeight;
                MachineOutcome::reply(
                    RenderDirective::text(format!(
                        "You chose: {}.\n\nNow your weight in kg (e.g. 70.5):",
                        sex.label()
                    ))
                    .edited(),
                )
            }
            ChoiceToken::Activity(activity)
                if session.state == DialogueState::AwaitingActivity =>
            {
                session.draft.activity = Some(activity);
                session.state = DialogueState::AwaitingGoal;
                MachineOutcome::reply(goal_directive(activity).edited())
            }
            ChoiceToken::Goal(goal) if session.state == DialogueState::AwaitingGoal => {
                session.draft.goal = Some(goal);
                session.state = DialogueState::Complete;
                MachineOutcome::reply(complete_directive(goal).edited())
            }

            ChoiceToken::Calculate => self.calculate(session).await,
            ChoiceToken::UseExisting => self.use_existing(session).await,
            ChoiceToken::GenerateMenu => self.recap_for_generation(session).await,
            ChoiceToken::ConfirmGenerate => self.confirm_generation(session).await,

            ChoiceToken::NextDay => Self::navigate(session, true),
            ChoiceToken::PrevDay => Self::navigate(session, false),

            // A collection choice outside its expected state: stale button.
            ChoiceToken::Sex(_) | ChoiceToken::Activity(_) | ChoiceToken::Goal(_) => {
                tracing::debug!(
                    user_id = %session.user_id,
                    state = %session.state,
                    "Ignoring stale collection choice"
                );
                MachineOutcome::reply(guidance_directive())
            }
        }
    }

    // ── Completion operations ───────────────────────────────────────

    /// Compute the daily calorie target from the completed draft, append
    /// the full record, and show the breakdown.
    ///
    /// An append failure is fatal for persistence only: the computed result
    /// is still shown, with the failure surfaced in logs.
    async fn calculate(&self, session: &mut Session) -> MachineOutcome {
        let Some(mut profile) = session.draft.finalize(&session.user_id) else {
            return MachineOutcome::reply(guidance_directive());
        };

        let calories = compute_daily_calories(&profile);
        profile.calories = Some(calories);

        if let Err(e) = self.store.append(&profile).await {
            tracing::error!(user_id = %session.user_id, error = %e, "Failed to persist profile");
        }

        let bmr = basal_metabolic_rate(
            profile.sex,
            profile.weight_kg,
            profile.height_cm,
            profile.age_years,
        );
        let text = format!(
            "🔥 Your daily target is {calories} calories.\n\n\
             Breakdown:\n\
             • Basal metabolic rate: {bmr:.0} cal\n\
             • Activity multiplier: {}x\n\
             • Goal: {}\n\n\
             I'll adjust portions in your meal plan based on your goal.",
            activity_multiplier(profile.activity.into()),
            profile.goal.label().to_lowercase(),
        );

        MachineOutcome::reply(RenderDirective::text(text).with_buttons(vec![
            vec![Button::new(
                "🗓️ Generate meal plan",
                ChoiceToken::ConfirmGenerate.as_token(),
            )],
            vec![Button::new("🏠 Main menu", ChoiceToken::MainMenu.as_token())],
        ]))
    }

    /// Short-circuit branch: replace the entire draft with the stored
    /// profile, skipping the six questions for a returning user.
    async fn use_existing(&self, session: &mut Session) -> MachineOutcome {
        match self.store.latest_valid_for(&session.user_id).await {
            Ok(Some(profile)) => {
                session.draft = DraftProfile::from(&profile);
                session.state = DialogueState::Complete;
                MachineOutcome::reply(
                    RenderDirective::text(format!(
                        "Using your saved profile:\n{}\n\nWhat would you like to do?",
                        profile.summary()
                    ))
                    .with_buttons(vec![
                        vec![Button::new(
                            "🔢 Calculate calories",
                            ChoiceToken::Calculate.as_token(),
                        )],
                        vec![Button::new(
                            "🗓️ Generate meal plan",
                            ChoiceToken::ConfirmGenerate.as_token(),
                        )],
                        vec![Button::new("🏠 Main menu", ChoiceToken::MainMenu.as_token())],
                    ])
                    .edited(),
                )
            }
            Ok(None) => MachineOutcome::reply(lookup_miss_directive()),
            Err(e) => {
                tracing::error!(user_id = %session.user_id, error = %e, "Profile lookup failed");
                MachineOutcome::reply(lookup_miss_directive())
            }
        }
    }

    /// Pre-generation recap: show the stored profile and ask for a confirm
    /// press before the long generation call.
    async fn recap_for_generation(&self, session: &mut Session) -> MachineOutcome {
        match self.store.latest_valid_for(&session.user_id).await {
            Ok(Some(profile)) => MachineOutcome::reply(
                RenderDirective::text(format!(
                    "I'll build a week menu for:\n{}\n\nReady?",
                    profile.summary()
                ))
                .with_buttons(vec![
                    vec![Button::new(
                        "✅ Generate a week menu",
                        ChoiceToken::ConfirmGenerate.as_token(),
                    )],
                    vec![Button::new("🏠 Main menu", ChoiceToken::MainMenu.as_token())],
                ])
                .edited(),
            ),
            Ok(None) => MachineOutcome::reply(lookup_miss_directive()),
            Err(e) => {
                tracing::error!(user_id = %session.user_id, error = %e, "Profile lookup failed");
                MachineOutcome::reply(lookup_miss_directive())
            }
        }
    }

    /// Resolve the profile to generate for and hand the long call back to
    /// the caller. Prefers the in-session draft (it may be fresher than the
    /// stored history), falling back to the store.
    async fn confirm_generation(&self, session: &mut Session) -> MachineOutcome {
        let profile = if let Some(profile) = session.draft.finalize(&session.user_id) {
            Some(profile)
        } else {
            match self.store.latest_valid_for(&session.user_id).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::error!(user_id = %session.user_id, error = %e, "Profile lookup failed");
                    None
                }
            }
        };

        let Some(profile) = profile else {
            return MachineOutcome::reply(lookup_miss_directive());
        };

        let daily_calories = profile
            .calories
            .unwrap_or_else(|| compute_daily_calories(&profile));

        MachineOutcome::StartGeneration {
            profile,
            daily_calories,
            epoch: session.epoch,
            notice: RenderDirective::text(
                "🤖 Creating your personalized menu...\n\
                 This can take up to a minute. Please wait!",
            )
            .edited(),
        }
    }

    // ── Page navigation ─────────────────────────────────────────────

    fn navigate(session: &mut Session, forward: bool) -> MachineOutcome {
        let moved = if forward {
            session.pager.advance().map(|_| ())
        } else {
            session.pager.retreat().map(|_| ())
        };
        match moved {
            Ok(()) => match page_directive(&session.pager) {
                Ok(directive) => MachineOutcome::reply(directive),
                Err(_) => MachineOutcome::reply(guidance_directive()),
            },
            Err(_) => MachineOutcome::reply(
                RenderDirective::text("There's no menu loaded. Generate one first!")
                    .with_buttons(vec![vec![Button::new(
                        "🏠 Main menu",
                        ChoiceToken::MainMenu.as_token(),
                    )]])
                    .edited(),
            ),
        }
    }
}

// ── Render directive builders ───────────────────────────────────────

/// Main menu shown on /start and after every completed interaction.
pub fn main_menu_directive() -> RenderDirective {
    RenderDirective::text(
        "Here's the main menu:\n\
         1. Fill in your data and get a calorie estimate\n\
         2. Reuse your saved profile\n\
         3. Generate a week menu",
    )
    .with_buttons(vec![
        vec![
            Button::new("📝 Fill in", ChoiceToken::StartProfile.as_token()),
            Button::new("♻️ Use saved profile", ChoiceToken::UseExisting.as_token()),
        ],
        vec![Button::new(
            "🗓️ Generate menu",
            ChoiceToken::GenerateMenu.as_token(),
        )],
    ])
}

/// Render the pager's current page with boundary-gated navigation buttons
/// and a progress indicator. Edits the message in place so paging does not
/// flood the chat.
pub fn page_directive(pager: &PlanPager) -> Result<RenderDirective, PlanError> {
    let day = pager.current()?;

    let mut nav_row = Vec::new();
    if pager.has_prev() {
        nav_row.push(Button::new("◀️ Previous day", ChoiceToken::PrevDay.as_token()));
    }
    if pager.has_next() {
        nav_row.push(Button::new("Next day ▶️", ChoiceToken::NextDay.as_token()));
    }

    let mut rows = Vec::new();
    if !nav_row.is_empty() {
        rows.push(nav_row);
    }
    rows.push(vec![Button::new(
        format!("📍 Day {} of {}", pager.page_index() + 1, pager.len()),
        ChoiceToken::Noop.as_token(),
    )]);
    rows.push(vec![Button::new(
        "🏠 Main menu",
        ChoiceToken::MainMenu.as_token(),
    )]);

    Ok(RenderDirective::text(day.render()).with_buttons(rows).edited())
}

fn sex_directive() -> RenderDirective {
    RenderDirective::text("Let's fill in your profile. First, your sex:").with_buttons(vec![vec![
        Button::new("Male", ChoiceToken::Sex(Sex::Male).as_token()),
        Button::new("Female", ChoiceToken::Sex(Sex::Female).as_token()),
    ]])
}

fn activity_directive() -> RenderDirective {
    let description = ActivityLevel::ALL
        .iter()
        .map(|a| format!("• {}: {}", a.label().to_lowercase(), a.description()))
        .collect::<Vec<_>>()
        .join("\n");

    RenderDirective::text(format!("How active are you?\n{description}")).with_buttons(vec![
        vec![
            Button::new(
                ActivityLevel::Minimal.label(),
                ChoiceToken::Activity(ActivityLevel::Minimal).as_token(),
            ),
            Button::new(
                ActivityLevel::Light.label(),
                ChoiceToken::Activity(ActivityLevel::Light).as_token(),
            ),
        ],
        vec![
            Button::new(
                ActivityLevel::Moderate.label(),
                ChoiceToken::Activity(ActivityLevel::Moderate).as_token(),
            ),
            Button::new(
                ActivityLevel::High.label(),
                ChoiceToken::Activity(ActivityLevel::High).as_token(),
            ),
        ],
        vec![Button::new(
            ActivityLevel::Extreme.label(),
            ChoiceToken::Activity(ActivityLevel::Extreme).as_token(),
        )],
    ])
}

fn goal_directive(chosen_activity: ActivityLevel) -> RenderDirective {
    RenderDirective::text(format!(
        "You chose: {}.\n\nWhat's your goal?",
        chosen_activity.label().to_lowercase()
    ))
    .with_buttons(vec![
        Goal::ALL
            .iter()
            .map(|g| Button::new(g.label(), ChoiceToken::Goal(*g).as_token()))
            .collect(),
    ])
}

fn complete_directive(goal: Goal) -> RenderDirective {
    RenderDirective::text(format!(
        "You chose: {}.\n\nThe form is complete! Want your daily calorie target?",
        goal.label().to_lowercase()
    ))
    .with_buttons(vec![
        vec![Button::new(
            "🔢 Calculate",
            ChoiceToken::Calculate.as_token(),
        )],
        vec![Button::new("🏠 Main menu", ChoiceToken::MainMenu.as_token())],
    ])
}

fn lookup_miss_directive() -> RenderDirective {
    RenderDirective::text("I couldn't find your profile data. Please fill it in first!")
        .with_buttons(vec![vec![Button::new(
            "📝 Fill in",
            ChoiceToken::StartProfile.as_token(),
        )]])
        .edited()
}

fn guidance_directive() -> RenderDirective {
    RenderDirective::text("Please use the menu buttons. Send /start to see the main menu.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// In-memory store for machine tests.
    #[derive(Default)]
    struct MemStore {
        rows: Mutex<Vec<Profile>>,
        fail_appends: bool,
    }

    #[async_trait]
    impl ProfileStore for MemStore {
        async fn append(&self, profile: &Profile) -> Result<(), StorageError> {
            if self.fail_appends {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.rows.lock().await.push(profile.clone());
            Ok(())
        }

        async fn latest_valid_for(&self, user_id: &str) -> Result<Option<Profile>, StorageError> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .rev()
                .find(|p| p.user_id == user_id)
                .cloned())
        }
    }

    fn machine() -> (Arc<MemStore>, DialogueMachine) {
        let store = Arc::new(MemStore::default());
        let m = DialogueMachine::new(store.clone() as Arc<dyn ProfileStore>);
        (store, m)
    }

    fn stored_profile(user_id: &str) -> Profile {
        Profile {
            user_id: user_id.into(),
            sex: Sex::Female,
            weight_kg: 60.0,
            height_cm: 165.0,
            age_years: 30,
            activity: ActivityLevel::Light,
            goal: Goal::Lose,
            calories: Some(1815),
        }
    }

    fn replies(outcome: MachineOutcome) -> Vec<RenderDirective> {
        match outcome {
            MachineOutcome::Replies(r) => r,
            other => panic!("expected replies, got {other:?}"),
        }
    }

    /// Walk the full linear collection flow up to Complete.
    async fn collect_full(m: &DialogueMachine, session: &mut Session) {
        replies(m.handle_choice(session, ChoiceToken::StartProfile).await);
        replies(m.handle_choice(session, ChoiceToken::Sex(Sex::Male)).await);
        m.handle_text(session, "70").await;
        m.handle_text(session, "175").await;
        m.handle_text(session, "25").await;
        replies(
            m.handle_choice(session, ChoiceToken::Activity(ActivityLevel::Moderate))
                .await,
        );
        replies(m.handle_choice(session, ChoiceToken::Goal(Goal::Maintain)).await);
    }

    #[tokio::test]
    async fn linear_collection_reaches_complete() {
        let (_store, m) = machine();
        let mut session = Session::new("u1");

        collect_full(&m, &mut session).await;

        assert_eq!(session.state, DialogueState::Complete);
        assert!(session.draft.is_complete());
        assert_eq!(session.draft.weight_kg, Some(70.0));
        assert_eq!(session.draft.age_years, Some(25));
    }

    #[tokio::test]
    async fn invalid_weight_keeps_state_and_draft() {
        let (_store, m) = machine();
        let mut session = Session::new("u1");
        replies(m.handle_choice(&mut session, ChoiceToken::StartProfile).await);
        replies(m.handle_choice(&mut session, ChoiceToken::Sex(Sex::Male)).await);

        for bad in ["abc", "-5", "600"] {
            let out = m.handle_text(&mut session, bad).await;
            assert_eq!(session.state, DialogueState::AwaitingWeight, "after {bad:?}");
            assert_eq!(session.draft.weight_kg, None);
            assert_eq!(out.len(), 1, "one corrective prompt for {bad:?}");
        }

        // Retry succeeds and advances.
        m.handle_text(&mut session, "70").await;
        assert_eq!(session.state, DialogueState::AwaitingHeight);
        assert_eq!(session.draft.weight_kg, Some(70.0));
    }

    #[tokio::test]
    async fn text_outside_collection_states_is_inert() {
        let (_store, m) = machine();
        let mut session = Session::new("u1");

        for state in [DialogueState::Idle, DialogueState::AwaitingSex, DialogueState::Complete] {
            session.state = state;
            let draft_before = session.draft.clone();
            let out = m.handle_text(&mut session, "stray input").await;
            assert_eq!(session.state, state);
            assert_eq!(session.draft, draft_before);
            assert!(out[0].text.contains("menu"));
        }
    }

    #[tokio::test]
    async fn stale_choice_is_inert() {
        let (_store, m) = machine();
        let mut session = Session::new("u1");

        let out = replies(
            m.handle_choice(&mut session, ChoiceToken::Sex(Sex::Female))
                .await,
        );
        assert_eq!(session.state, DialogueState::Idle);
        assert_eq!(session.draft.sex, None);
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn restart_resets_from_every_reachable_state() {
        let (store, m) = machine();
        store.rows.lock().await.push(stored_profile("u1"));

        // Reach each state in turn and fire a restart from it.
        for steps in 0..=7 {
            let mut session = Session::new("u1");
            let script: Vec<&str> = vec!["start", "sex", "w", "h", "a", "act", "goal"];
            for step in script.iter().take(steps) {
                match *step {
                    "start" => {
                        replies(m.handle_choice(&mut session, ChoiceToken::StartProfile).await);
                    }
                    "sex" => {
                        replies(
                            m.handle_choice(&mut session, ChoiceToken::Sex(Sex::Male)).await,
                        );
                    }
                    "w" => {
                        m.handle_text(&mut session, "70").await;
                    }
                    "h" => {
                        m.handle_text(&mut session, "175").await;
                    }
                    "a" => {
                        m.handle_text(&mut session, "25").await;
                    }
                    "act" => {
                        replies(
                            m.handle_choice(
                                &mut session,
                                ChoiceToken::Activity(ActivityLevel::Moderate),
                            )
                            .await,
                        );
                    }
                    "goal" => {
                        replies(
                            m.handle_choice(&mut session, ChoiceToken::Goal(Goal::Maintain))
                                .await,
                        );
                    }
                    _ => unreachable!(),
                }
            }

            let epoch_before = session.epoch;
            replies(m.handle_choice(&mut session, ChoiceToken::MainMenu).await);
            assert_eq!(session.state, DialogueState::Idle);
            assert_eq!(session.draft, DraftProfile::default());
            assert!(!session.pager.is_loaded());
            assert_eq!(session.epoch, epoch_before + 1);
        }
    }

    #[tokio::test]
    async fn calculate_appends_record_with_calories() {
        let (store, m) = machine();
        let mut session = Session::new("u1");
        collect_full(&m, &mut session).await;

        let out = replies(m.handle_choice(&mut session, ChoiceToken::Calculate).await);

        // Closed form: bmr 1673.75 * 1.55 = 2594.3 → 2594
        assert!(out[0].text.contains("2594"));
        let rows = store.rows.lock().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].calories, Some(2594));
        assert_eq!(rows[0].user_id, "u1");
        drop(rows);
        assert_eq!(session.state, DialogueState::Complete);
    }

    #[tokio::test]
    async fn calculate_still_shows_result_when_append_fails() {
        let store = Arc::new(MemStore {
            fail_appends: true,
            ..Default::default()
        });
        let m = DialogueMachine::new(store.clone() as Arc<dyn ProfileStore>);
        let mut session = Session::new("u1");
        collect_full(&m, &mut session).await;

        let out = replies(m.handle_choice(&mut session, ChoiceToken::Calculate).await);
        assert!(out[0].text.contains("2594"), "result shown despite append failure");
        assert!(store.rows.lock().await.is_empty());
    }

    #[tokio::test]
    async fn use_existing_overwrites_in_progress_draft() {
        let (store, m) = machine();
        store.rows.lock().await.push(stored_profile("u1"));

        let mut session = Session::new("u1");
        // Enter fields that conflict with the stored profile.
        replies(m.handle_choice(&mut session, ChoiceToken::StartProfile).await);
        replies(m.handle_choice(&mut session, ChoiceToken::Sex(Sex::Male)).await);
        m.handle_text(&mut session, "99").await;

        replies(m.handle_choice(&mut session, ChoiceToken::UseExisting).await);

        assert_eq!(session.state, DialogueState::Complete);
        assert_eq!(session.draft.sex, Some(Sex::Female));
        assert_eq!(session.draft.weight_kg, Some(60.0));
        assert_eq!(session.draft.goal, Some(Goal::Lose));
        assert!(session.draft.is_complete());
    }

    #[tokio::test]
    async fn use_existing_without_stored_profile_is_a_lookup_miss() {
        let (_store, m) = machine();
        let mut session = Session::new("u1");

        let out = replies(m.handle_choice(&mut session, ChoiceToken::UseExisting).await);
        assert!(out[0].text.contains("fill it in"));
        assert_eq!(session.state, DialogueState::Idle);
        assert_eq!(session.draft, DraftProfile::default());
    }

    #[tokio::test]
    async fn confirm_generation_prefers_completed_draft() {
        let (store, m) = machine();
        store.rows.lock().await.push(stored_profile("u1"));

        let mut session = Session::new("u1");
        collect_full(&m, &mut session).await;

        match m.handle_choice(&mut session, ChoiceToken::ConfirmGenerate).await {
            MachineOutcome::StartGeneration {
                profile,
                daily_calories,
                epoch,
                ..
            } => {
                // Draft (male, 70kg) wins over the stored female profile.
                assert_eq!(profile.sex, Sex::Male);
                assert_eq!(daily_calories, 2594);
                // Epoch is captured under the same lock as the transition.
                assert_eq!(epoch, session.epoch);
            }
            other => panic!("expected StartGeneration, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn confirm_generation_falls_back_to_store_then_misses() {
        let (store, m) = machine();
        let mut session = Session::new("u1");

        // Nothing anywhere: lookup miss.
        let out = replies(
            m.handle_choice(&mut session, ChoiceToken::ConfirmGenerate).await,
        );
        assert!(out[0].text.contains("fill it in"));

        // Stored profile only: generation proceeds from the store.
        store.rows.lock().await.push(stored_profile("u1"));
        match m.handle_choice(&mut session, ChoiceToken::ConfirmGenerate).await {
            MachineOutcome::StartGeneration { profile, daily_calories, .. } => {
                assert_eq!(profile.sex, Sex::Female);
                assert_eq!(daily_calories, 1815);
            }
            other => panic!("expected StartGeneration, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn navigation_without_plan_points_back_to_menu() {
        let (_store, m) = machine();
        let mut session = Session::new("u1");

        let out = replies(m.handle_choice(&mut session, ChoiceToken::NextDay).await);
        assert!(out[0].text.contains("no menu loaded"));
    }

    #[tokio::test]
    async fn navigation_clamps_and_gates_buttons() {
        use crate::plan::DayPlan;

        let (_store, m) = machine();
        let mut session = Session::new("u1");
        session
            .pager
            .load(vec![DayPlan::new("Day 1"), DayPlan::new("Day 2")])
            .unwrap();

        // First page: no prev button.
        let d = page_directive(&session.pager).unwrap();
        let tokens: Vec<&str> = d
            .buttons
            .iter()
            .flatten()
            .map(|b| b.token.as_str())
            .collect();
        assert!(!tokens.contains(&"menu_prev"));
        assert!(tokens.contains(&"menu_next"));
        assert!(tokens.contains(&"noop"));

        // Advance to the boundary and past it: clamps on Day 2.
        replies(m.handle_choice(&mut session, ChoiceToken::NextDay).await);
        let out = replies(m.handle_choice(&mut session, ChoiceToken::NextDay).await);
        assert!(out[0].text.contains("Day 2"));
        assert_eq!(session.pager.page_index(), 1);

        // Last page: no next button, prev present.
        let tokens: Vec<String> = out[0]
            .buttons
            .iter()
            .flatten()
            .map(|b| b.token.clone())
            .collect();
        assert!(tokens.contains(&"menu_prev".to_string()));
        assert!(!tokens.contains(&"menu_next".to_string()));
    }

    #[tokio::test]
    async fn start_command_resets_and_shows_menu() {
        let (_store, m) = machine();
        let mut session = Session::new("u1");
        collect_full(&m, &mut session).await;

        let out = m.handle_text(&mut session, "/start").await;
        assert_eq!(session.state, DialogueState::Idle);
        assert_eq!(session.draft, DraftProfile::default());
        assert_eq!(out.len(), 2);
        assert!(out[1].text.contains("main menu"));
    }

    #[tokio::test]
    async fn noop_produces_no_replies() {
        let (_store, m) = machine();
        let mut session = Session::new("u1");
        let out = replies(m.handle_choice(&mut session, ChoiceToken::Noop).await);
        assert!(out.is_empty());
    }
}
