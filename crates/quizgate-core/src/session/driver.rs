//! Cooperative single-task session driver.
//!
//! The driver owns the orchestrator and multiplexes three sources on one
//! task: commands from [`SessionHandle`]s and modal inputs, a one-second
//! interval that advances countdowns, and the in-flight question fetch.
//! Nothing else ever holds the orchestrator, so no session state is shared.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};

use super::acquire::{Acquisition, FetchTask};
use super::orchestrator::{SessionOrchestrator, SessionStatus};
use crate::block::{Disposition, HostPage, InputEvent};
use crate::error::SessionError;
use crate::events::Event;
use crate::render::{ModalAction, ModalRenderer, RegistrationId};

const TICK: Duration = Duration::from_secs(1);

/// Message accepted by the driver.
#[derive(Debug)]
pub enum SessionCommand {
    /// Start a quiz regardless of the schedule.
    ForceQuiz {
        reply: Option<oneshot::Sender<Result<(), SessionError>>>,
    },
    /// Start a quiz if one is due. Replies whether a session started.
    CheckDue {
        reply: Option<oneshot::Sender<Result<bool, SessionError>>>,
    },
    /// Input reported by a mounted modal.
    Modal {
        registration: RegistrationId,
        action: ModalAction,
    },
    /// Page event caught by a capture listener.
    Input {
        event: InputEvent,
        reply: oneshot::Sender<Disposition>,
    },
    Status {
        reply: oneshot::Sender<SessionStatus>,
    },
    Shutdown,
}

/// Cloneable entry point to a running driver.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Start a quiz now. Refused while a session is active.
    pub async fn force_quiz(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::ForceQuiz { reply: Some(reply) })
            .await?
    }

    /// Start a quiz if the interval has elapsed.
    pub async fn check_due(&self) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::CheckDue { reply: Some(reply) })
            .await?
    }

    pub async fn dispatch_input(&self, event: InputEvent) -> Result<Disposition, SessionError> {
        self.request(|reply| SessionCommand::Input { event, reply }).await
    }

    pub async fn status(&self) -> Result<SessionStatus, SessionError> {
        self.request(|reply| SessionCommand::Status { reply }).await
    }

    /// Fire-and-forget variant of [`Self::force_quiz`].
    pub fn request_quiz(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::ForceQuiz { reply: None })
    }

    /// Stop the driver. A running session is torn down first.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown)
    }

    fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx.send(command).map_err(|_| SessionError::DriverClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply))?;
        rx.await.map_err(|_| SessionError::DriverClosed)
    }
}

pub struct SessionDriver<P: HostPage, R: ModalRenderer> {
    orchestrator: SessionOrchestrator<P, R>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    tx: mpsc::UnboundedSender<SessionCommand>,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl<P: HostPage, R: ModalRenderer> SessionDriver<P, R> {
    pub fn new(mut orchestrator: SessionOrchestrator<P, R>) -> Self {
        let (tx, commands) = mpsc::unbounded_channel();
        orchestrator.attach_commands(&tx);
        Self {
            orchestrator,
            commands,
            tx,
            events: None,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.tx.clone(),
        }
    }

    /// Receive every event the orchestrator produces.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Run until [`SessionHandle::shutdown`] or until every handle and modal
    /// input registration is dropped, then hand the orchestrator back.
    pub async fn run(self) -> SessionOrchestrator<P, R> {
        let Self {
            mut orchestrator,
            mut commands,
            events,
            tx,
        } = self;
        // Stop once every handle is dropped.
        drop(tx);

        let mut pending: Option<FetchTask> = None;
        let mut ticker = time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.reset();

        tracing::debug!("session driver started");
        loop {
            tokio::select! {
                biased;

                acquisition = poll_fetch(&mut pending), if pending.is_some() => {
                    pending = None;
                    orchestrator.complete_fetch(acquisition);
                }
                _ = ticker.tick() => orchestrator.tick(),
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if !dispatch(&mut orchestrator, &mut pending, command) {
                        break;
                    }
                }
            }
            if orchestrator.take_countdown_restarted() {
                ticker.reset();
            }
            forward(&mut orchestrator, events.as_ref());
        }

        orchestrator.shutdown();
        forward(&mut orchestrator, events.as_ref());
        tracing::debug!("session driver stopped");
        orchestrator
    }
}

async fn poll_fetch(pending: &mut Option<FetchTask>) -> Acquisition {
    match pending {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

/// Apply one command. Returns `false` when the driver should stop.
fn dispatch<P: HostPage, R: ModalRenderer>(
    orchestrator: &mut SessionOrchestrator<P, R>,
    pending: &mut Option<FetchTask>,
    command: SessionCommand,
) -> bool {
    match command {
        SessionCommand::ForceQuiz { reply } => {
            let result = orchestrator.force_quiz().map(|task| {
                *pending = Some(task);
            });
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }
        SessionCommand::CheckDue { reply } => {
            let result = orchestrator.start_if_due(Utc::now()).map(|task| {
                let started = task.is_some();
                if task.is_some() {
                    *pending = task;
                }
                started
            });
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }
        SessionCommand::Modal {
            registration,
            action,
        } => {
            orchestrator.handle_modal_action(registration, action);
        }
        SessionCommand::Input { event, reply } => {
            let _ = reply.send(orchestrator.handle_input(&event));
        }
        SessionCommand::Status { reply } => {
            let _ = reply.send(orchestrator.status());
        }
        SessionCommand::Shutdown => return false,
    }
    true
}

fn forward<P: HostPage, R: ModalRenderer>(
    orchestrator: &mut SessionOrchestrator<P, R>,
    events: Option<&mpsc::UnboundedSender<Event>>,
) {
    let drained = orchestrator.drain_events();
    let Some(tx) = events else {
        return;
    };
    for event in drained {
        if tx.send(event).is_err() {
            break;
        }
    }
}
