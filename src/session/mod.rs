// src/session/mod.rs

//! The quiz-attempt state machine.
//!
//! A `QuizSession` drives one attempt from loading to scored completion:
//! `NotStarted -> Running -> Submitting -> Completed`, or `Abandoned` when
//! discarded first. The countdown runs as a separate task holding only a weak
//! reference, so it cannot act on a session that has been torn down.

pub mod countdown;
pub mod error;
pub mod scoring;


use std::{
    collections::HashMap,
    ops::ControlFlow,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::watch, time::Instant};

use crate::{
    models::{
        attempt::{AttemptRecord, QuizResult},
        quiz::{AnswerValue, PublicQuestion, Quiz},
    },
    services::{AttemptLog, QuizCatalog},
    utils::time::format_clock,
};

use countdown::Countdown;
use error::{PersistenceWarning, SessionError};

/// Countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Running,
    Submitting,
    Completed,
    /// Discarded before completion. Terminal.
    Abandoned,
}

/// Who is taking the quiz. Passed in explicitly; the session never looks up
/// ambient credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: String,
    /// Bearer token forwarded to the backend services.
    pub auth_token: Option<String>,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            auth_token,
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", None)
    }
}

/// Outcome of `submit()`: the scored result plus, if the attempt log
/// refused it, a non-fatal warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub result: QuizResult,
    pub warning: Option<PersistenceWarning>,
}

/// Read-only snapshot for presentation. Never contains correct answers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub quiz_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub difficulty: String,
    pub time_limit: i64,
    pub phase: Phase,
    pub current_index: usize,
    pub total_questions: usize,
    pub is_last_question: bool,
    pub question: PublicQuestion,
    pub current_answer: Option<AnswerValue>,
    pub answered: usize,
    pub remaining_seconds: i64,
    pub clock: String,
    pub result: Option<QuizResult>,
    pub warning: Option<PersistenceWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    User,
    Timeout,
}

#[derive(Debug, Clone)]
enum Settled {
    Pending,
    Completed(Submission),
    Abandoned,
}

enum Tick {
    Continue,
    Expired,
    Stop,
}

struct SessionState {
    phase: Phase,
    current_index: usize,
    answers: HashMap<i64, AnswerValue>,
    remaining_seconds: i64,
    started_at: Option<Instant>,
    submission: Option<Submission>,
    countdown: Option<Countdown>,
}

struct Shared {
    quiz: Quiz,
    ctx: SessionContext,
    attempt_log: Arc<dyn AttemptLog>,
    state: Mutex<SessionState>,
    settled: watch::Sender<Settled>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores a completed attempt with the attempt log. Failures become a
    /// warning on the stored submission.
    async fn record_attempt(&self, record: AttemptRecord) -> Option<PersistenceWarning> {
        match self.attempt_log.record_attempt(&self.ctx, &record).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to record attempt for quiz {}: {}", record.quiz_id, e);
                let warning = PersistenceWarning {
                    message: e.to_string(),
                };
                self.attach_warning(warning.clone());
                Some(warning)
            }
        }
    }

    fn attach_warning(&self, warning: PersistenceWarning) {
        let submission = {
            let mut state = self.state();
            let Some(submission) = state.submission.as_mut() else {
                return;
            };
            submission.warning = Some(warning);
            submission.clone()
        };
        self.settled.send_replace(Settled::Completed(submission));
    }

    fn tick(&self) -> Tick {
        let mut state = self.state();
        if state.phase != Phase::Running {
            return Tick::Stop;
        }
        state.remaining_seconds = (state.remaining_seconds - 1).max(0);
        if state.remaining_seconds == 0 {
            Tick::Expired
        } else {
            Tick::Continue
        }
    }
}

/// Handle to one quiz attempt. Clones share the same attempt; dropping the
/// last handle stops the countdown.
#[derive(Clone)]
pub struct QuizSession {
    shared: Arc<Shared>,
}

impl QuizSession {
    /// Fetches the quiz from the catalog and prepares a `NotStarted` session.
    ///
    /// * `NotFound` if the catalog does not know the quiz.
    /// * `Transport` if the catalog is unreachable.
    /// * `Configuration` if the quiz has no questions or a non-positive time limit.
    pub async fn load(
        catalog: &dyn QuizCatalog,
        attempt_log: Arc<dyn AttemptLog>,
        ctx: SessionContext,
        quiz_id: i64,
    ) -> Result<Self, SessionError> {
        let quiz = catalog.fetch_quiz(&ctx, quiz_id).await.map_err(|e| {
            tracing::warn!("Failed to load quiz {}: {}", quiz_id, e);
            e
        })?;

        Self::new(quiz, attempt_log, ctx)
    }

    /// Builds a session around an already-fetched quiz.
    pub fn new(
        quiz: Quiz,
        attempt_log: Arc<dyn AttemptLog>,
        ctx: SessionContext,
    ) -> Result<Self, SessionError> {
        quiz.validate_for_session()?;

        let state = SessionState {
            phase: Phase::NotStarted,
            current_index: 0,
            answers: HashMap::new(),
            remaining_seconds: quiz.time_limit,
            started_at: None,
            submission: None,
            countdown: None,
        };
        let (settled, _) = watch::channel(Settled::Pending);

        tracing::debug!("Session ready for quiz {} ({})", quiz.id, ctx.user_id);

        Ok(Self {
            shared: Arc::new(Shared {
                quiz,
                ctx,
                attempt_log,
                state: Mutex::new(state),
                settled,
            }),
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.shared.quiz
    }

    pub fn context(&self) -> &SessionContext {
        &self.shared.ctx
    }

    pub fn phase(&self) -> Phase {
        self.shared.state().phase
    }

    /// Starts the attempt and arms the countdown.
    ///
    /// Only acts on a `NotStarted` session; every other phase is a no-op so
    /// duplicate start events are harmless. Returns whether this call started it.
    pub fn start(&self) -> bool {
        let mut state = self.shared.state();
        if state.phase != Phase::NotStarted {
            return false;
        }

        state.phase = Phase::Running;
        state.started_at = Some(Instant::now());
        state.countdown = Some(self.arm_countdown());

        tracing::info!(
            "Quiz {} started by {} ({}s)",
            self.shared.quiz.id,
            self.shared.ctx.user_id,
            state.remaining_seconds
        );
        true
    }

    fn arm_countdown(&self) -> Countdown {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);

        Countdown::spawn(TICK_PERIOD, move || {
            let weak = weak.clone();
            async move {
                let Some(shared) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                match shared.tick() {
                    Tick::Continue => ControlFlow::Continue(()),
                    Tick::Stop => ControlFlow::Break(()),
                    Tick::Expired => {
                        tracing::info!("Time is up for quiz {}", shared.quiz.id);
                        let session = QuizSession { shared };
                        if let Err(e) = session.finish(Trigger::Timeout).await {
                            tracing::debug!("Auto-submit skipped: {}", e);
                        }
                        ControlFlow::Break(())
                    }
                }
            }
        })
    }

    /// Records (or replaces) the answer for a question. Requires `Running`.
    /// The value itself is not checked against the options.
    pub fn record_answer(&self, question_id: i64, value: AnswerValue) -> Result<(), SessionError> {
        let mut state = self.shared.state();
        if state.phase != Phase::Running {
            return Err(SessionError::InvalidPhase {
                expected: Phase::Running,
                actual: state.phase,
            });
        }
        if self.shared.quiz.question(question_id).is_none() {
            return Err(SessionError::UnknownQuestion(question_id));
        }

        state.answers.insert(question_id, value);
        Ok(())
    }

    /// Moves forward one question; stays put on the last one.
    pub fn go_to_next(&self) -> usize {
        let last = self.shared.quiz.questions.len() - 1;
        let mut state = self.shared.state();
        if state.current_index < last {
            state.current_index += 1;
        }
        state.current_index
    }

    /// Moves back one question; stays put on the first one.
    pub fn go_to_previous(&self) -> usize {
        let mut state = self.shared.state();
        state.current_index = state.current_index.saturating_sub(1);
        state.current_index
    }

    pub fn is_last_question(&self) -> bool {
        self.shared.state().current_index == self.shared.quiz.questions.len() - 1
    }

    pub fn current_index(&self) -> usize {
        self.shared.state().current_index
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.shared.state().remaining_seconds
    }

    pub fn current_question(&self) -> PublicQuestion {
        let index = self.current_index();
        PublicQuestion::from(&self.shared.quiz.questions[index])
    }

    pub fn answers(&self) -> HashMap<i64, AnswerValue> {
        self.shared.state().answers.clone()
    }

    /// Submits the attempt.
    ///
    /// * Stops the countdown, grades the recorded answers and completes the
    ///   session before the attempt log is asked to store the result.
    /// * A log failure is returned as a warning next to the result; the
    ///   result itself is unaffected.
    /// * Once completed, further calls return the same submission without
    ///   grading or logging again.
    ///
    /// The log call runs on its own task, so dropping this future midway
    /// neither loses the result nor aborts the write.
    pub async fn submit(&self) -> Result<Submission, SessionError> {
        self.finish(Trigger::User).await
    }

    async fn finish(&self, trigger: Trigger) -> Result<Submission, SessionError> {
        let result = {
            let mut state = self.shared.state();
            match state.phase {
                Phase::Running => {}
                Phase::Submitting | Phase::Completed => {
                    return state.submission.clone().ok_or(SessionError::InvalidPhase {
                        expected: Phase::Completed,
                        actual: state.phase,
                    });
                }
                actual => {
                    return Err(SessionError::InvalidPhase {
                        expected: Phase::Running,
                        actual,
                    });
                }
            }

            state.phase = Phase::Submitting;
            if let Some(countdown) = state.countdown.take() {
                match trigger {
                    Trigger::User => countdown.cancel(),
                    // We are running inside the countdown task.
                    Trigger::Timeout => countdown.detach(),
                }
            }

            let result = self.build_result(&state);
            state.submission = Some(Submission {
                result: result.clone(),
                warning: None,
            });
            state.phase = Phase::Completed;
            result
        };
        self.shared.settled.send_replace(Settled::Completed(Submission {
            result: result.clone(),
            warning: None,
        }));

        tracing::info!(
            "Quiz {} submitted by {} ({:?}): {}/{} correct, score {}",
            result.quiz_id,
            self.shared.ctx.user_id,
            trigger,
            result.correct_answers,
            result.total_questions,
            result.score
        );

        let shared = self.shared.clone();
        let record = AttemptRecord::new(&self.shared.ctx.user_id, &result);
        let logging = tokio::spawn(async move { shared.record_attempt(record).await });

        let warning = match logging.await {
            Ok(warning) => warning,
            Err(e) => {
                tracing::error!("Attempt log task for quiz {} failed: {}", result.quiz_id, e);
                let warning = PersistenceWarning {
                    message: e.to_string(),
                };
                self.shared.attach_warning(warning.clone());
                Some(warning)
            }
        };

        Ok(Submission { result, warning })
    }

    fn build_result(&self, state: &SessionState) -> QuizResult {
        let quiz = &self.shared.quiz;
        let (correct_answers, outcomes) = scoring::grade(quiz, &state.answers);
        let total_questions = quiz.questions.len();

        let elapsed = state
            .started_at
            .map(|started| started.elapsed().as_secs())
            .unwrap_or_default();
        let time_limit = u64::try_from(quiz.time_limit).unwrap_or_default();

        QuizResult {
            quiz_id: quiz.id,
            quiz_title: quiz.title.clone(),
            total_questions,
            correct_answers,
            incorrect_answers: total_questions - correct_answers,
            score: scoring::score_percentage(correct_answers, total_questions),
            time_taken: elapsed.min(time_limit),
            completed_at: Utc::now(),
            outcomes,
        }
    }

    /// Resolves once the session completes, whichever path submits it.
    /// Fails with `InvalidPhase` if the session is discarded first.
    pub async fn wait_completed(&self) -> Result<Submission, SessionError> {
        let mut settled = self.shared.settled.subscribe();
        let outcome = settled
            .wait_for(|s| !matches!(s, Settled::Pending))
            .await
            .map(|s| s.clone());

        match outcome {
            Ok(Settled::Completed(submission)) => Ok(submission),
            _ => Err(SessionError::InvalidPhase {
                expected: Phase::Completed,
                actual: Phase::Abandoned,
            }),
        }
    }

    /// Abandons a session that has not been submitted yet. The countdown
    /// stops and no auto-submit can follow. Completed and in-flight
    /// submissions are left alone.
    pub fn discard(&self) {
        let mut state = self.shared.state();
        if let Some(countdown) = state.countdown.take() {
            countdown.cancel();
        }
        if matches!(state.phase, Phase::NotStarted | Phase::Running) {
            state.phase = Phase::Abandoned;
            drop(state);
            self.shared.settled.send_replace(Settled::Abandoned);
            tracing::info!(
                "Quiz {} abandoned by {}",
                self.shared.quiz.id,
                self.shared.ctx.user_id
            );
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.shared
            .state()
            .submission
            .as_ref()
            .map(|s| s.result.completed_at)
    }

    pub fn snapshot(&self) -> SessionView {
        let quiz = &self.shared.quiz;
        let state = self.shared.state();
        let question = &quiz.questions[state.current_index];

        SessionView {
            quiz_id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            category: quiz.category.clone(),
            difficulty: quiz.difficulty.clone(),
            time_limit: quiz.time_limit,
            phase: state.phase,
            current_index: state.current_index,
            total_questions: quiz.questions.len(),
            is_last_question: state.current_index == quiz.questions.len() - 1,
            question: PublicQuestion::from(question),
            current_answer: state.answers.get(&question.id).cloned(),
            answered: state.answers.len(),
            remaining_seconds: state.remaining_seconds,
            clock: format_clock(state.remaining_seconds),
            result: state.submission.as_ref().map(|s| s.result.clone()),
            warning: state.submission.as_ref().and_then(|s| s.warning.clone()),
        }
    }
}
