//! Sessions run through the async driver on a paused clock.

mod common;

use common::{fixture, ScriptedSource};
use quizgate_core::block::{Disposition, InputEvent};
use quizgate_core::events::{EndReason, Event};
use quizgate_core::session::{SessionDriver, SessionPhase};
use quizgate_core::timer::CountdownPurpose;
use quizgate_core::SessionError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Duration, Instant};

async fn next_matching(rx: &mut UnboundedReceiver<Event>, pred: impl Fn(&Event) -> bool) -> Event {
    loop {
        let event = rx.recv().await.expect("driver stopped");
        if pred(&event) {
            return event;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn driver_runs_a_correct_session_end_to_end() {
    let fx = fixture(ScriptedSource::default());
    let renderer = fx.renderer.clone();
    let link = fx.link;
    let mut driver = SessionDriver::new(fx.orchestrator);
    let mut events = driver.subscribe();
    let handle = driver.handle();
    let join = tokio::spawn(driver.run());

    handle.force_quiz().await.unwrap();
    next_matching(&mut events, |e| matches!(e, Event::QuestionPresented { .. })).await;

    assert_eq!(
        handle.force_quiz().await,
        Err(SessionError::AlreadyActive {
            phase: "presenting".into()
        })
    );
    assert_eq!(
        handle.dispatch_input(InputEvent::click(link)).await.unwrap(),
        Disposition::Suppress
    );

    let inputs = renderer.inputs().expect("modal mounted");
    assert!(inputs.submit("b"));
    next_matching(&mut events, |e| matches!(e, Event::AnswerEvaluated { correct: true, .. })).await;
    let review_started = Instant::now();

    let mut ticks = Vec::new();
    let done = loop {
        match events.recv().await.unwrap() {
            Event::CountdownTick {
                purpose: CountdownPurpose::Review,
                remaining_secs,
                ..
            } => ticks.push(remaining_secs),
            event @ Event::SessionCompleted { .. } => break event,
            _ => {}
        }
    };
    assert_eq!(ticks, (1..=10).rev().collect::<Vec<_>>());
    let elapsed = review_started.elapsed();
    assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    match done {
        Event::SessionCompleted { outcome, reason, .. } => {
            assert!(outcome.correct);
            assert_eq!(outcome.attempts, 1);
            assert_eq!(reason, EndReason::ReviewElapsed);
        }
        _ => unreachable!(),
    }

    let status = handle.status().await.unwrap();
    assert_eq!(status.phase, SessionPhase::Idle);
    assert_eq!(
        handle.dispatch_input(InputEvent::click(link)).await.unwrap(),
        Disposition::Allow
    );

    handle.shutdown().unwrap();
    let orchestrator = join.await.unwrap();
    assert!(orchestrator.last_completed().is_some());
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_session_unblocks_the_page() {
    let fx = fixture(ScriptedSource::default());
    let page = fx.page.clone();
    let mut driver = SessionDriver::new(fx.orchestrator);
    let mut events = driver.subscribe();
    let handle = driver.handle();
    let join = tokio::spawn(driver.run());

    assert!(handle.check_due().await.unwrap());
    next_matching(&mut events, |e| matches!(e, Event::QuestionPresented { .. })).await;
    assert!(page.scroll_locked());

    handle.shutdown().unwrap();
    let orchestrator = join.await.unwrap();
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);
    assert!(!page.scroll_locked());
    assert!(orchestrator.last_completed().is_none());
    assert!(matches!(handle.status().await, Err(SessionError::DriverClosed)));
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_auto_unblocks_through_driver() {
    let source = ScriptedSource::failing(3);
    let fx = fixture(source.clone());
    let page = fx.page.clone();
    let mut driver = SessionDriver::new(fx.orchestrator);
    let mut events = driver.subscribe();
    let handle = driver.handle();
    let join = tokio::spawn(driver.run());

    let started = Instant::now();
    handle.force_quiz().await.unwrap();
    let done = next_matching(&mut events, |e| matches!(e, Event::SessionCompleted { .. })).await;
    assert!(matches!(
        done,
        Event::SessionCompleted {
            reason: EndReason::FetchFailed,
            ..
        }
    ));
    // Two backoff pauses plus the error display.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(20) && elapsed < Duration::from_secs(21));
    assert_eq!(source.calls(), 3);
    assert!(!page.scroll_locked());

    handle.shutdown().unwrap();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn driver_stops_when_every_handle_is_dropped() {
    let fx = fixture(ScriptedSource::default());
    let driver = SessionDriver::new(fx.orchestrator);
    let handle = driver.handle();
    let join = tokio::spawn(driver.run());

    drop(handle);
    let orchestrator = tokio::time::timeout(Duration::from_secs(3600), join)
        .await
        .expect("driver exits once its handles are gone")
        .unwrap();
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn mounted_modal_keeps_driver_alive_until_session_ends() {
    let fx = fixture(ScriptedSource::default());
    let renderer = fx.renderer.clone();
    let page = fx.page.clone();
    let mut driver = SessionDriver::new(fx.orchestrator);
    let mut events = driver.subscribe();
    let handle = driver.handle();
    let join = tokio::spawn(driver.run());

    handle.force_quiz().await.unwrap();
    next_matching(&mut events, |e| matches!(e, Event::QuestionPresented { .. })).await;
    drop(handle);

    // The modal's registration still reaches the driver.
    let inputs = renderer.inputs().expect("modal mounted");
    assert!(inputs.submit("b"));
    drop(inputs);

    let orchestrator = tokio::time::timeout(Duration::from_secs(60), join)
        .await
        .expect("driver exits after the modal is unmounted")
        .unwrap();
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);
    assert!(orchestrator.last_completed().is_some());
    assert!(!page.scroll_locked());
}
