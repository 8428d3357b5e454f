//! Выключатель для внешнего каталога фильмов поверх `failsafe`.
//!
//! После `failure_threshold` подряд неудачных запросов цепь размыкается на
//! `open_for`. Затем пропускается пробный запрос (HalfOpen): успех замыкает
//! цепь, неудача снова размыкает. Какие ошибки считать сбоем, решает
//! вызывающий через предикат.

use failsafe::backoff::{self, Constant};
use failsafe::failure_policy::{consecutive_failures, ConsecutiveFailures};
use failsafe::futures::CircuitBreaker as _;
use failsafe::{Config, Instrument, StateMachine};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

/// Запоминает переходы состояний и пишет их в лог.
#[derive(Debug, Clone)]
struct StateTracker {
    state: Arc<AtomicU8>,
}

impl StateTracker {
    fn set(&self, state: CircuitState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

impl Instrument for StateTracker {
    fn on_call_rejected(&self) {
        warn!("Circuit breaker is OPEN - call rejected");
    }

    fn on_open(&self) {
        error!("Circuit breaker OPENED");
        self.set(CircuitState::Open);
    }

    fn on_half_open(&self) {
        info!("Circuit breaker transitioning to HalfOpen state");
        self.set(CircuitState::HalfOpen);
    }

    fn on_closed(&self) {
        info!("Circuit breaker recovered - transitioning to Closed state");
        self.set(CircuitState::Closed);
    }
}

pub type CircuitError<E> = failsafe::Error<E>;

pub struct CircuitBreaker {
    machine: StateMachine<ConsecutiveFailures<Constant>, StateTracker>,
    state: Arc<AtomicU8>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, open_for: Duration) -> Self {
        let state = Arc::new(AtomicU8::new(CircuitState::Closed.as_u8()));
        let machine = Config::new()
            .failure_policy(consecutive_failures(
                failure_threshold.max(1),
                backoff::constant(open_for),
            ))
            .instrument(StateTracker {
                state: state.clone(),
            })
            .build();
        Self { machine, state }
    }

    /// Выполняет `operation`, если цепь пропускает вызов. Ошибки, для которых
    /// `is_failure` вернул `false`, цепь не размыкают.
    pub async fn call_with<T, E, F, P>(
        &self,
        is_failure: P,
        operation: F,
    ) -> Result<T, CircuitError<E>>
    where
        F: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        self.machine.call_with(is_failure, operation).await
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    async fn fail(breaker: &CircuitBreaker) -> Result<(), CircuitError<&'static str>> {
        breaker
            .call_with(|_: &&str| true, async { Err::<(), _>("boom") })
            .await
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<(), CircuitError<&'static str>> {
        breaker
            .call_with(|_: &&str| true, async { Ok::<(), &'static str>(()) })
            .await
    }

    #[tokio::test]
    async fn opens_after_threshold_and_blocks_calls() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(matches!(fail(&breaker).await, Err(CircuitError::Inner("boom"))));
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        let ran = AtomicBool::new(false);
        let result = breaker
            .call_with(|_: &&str| true, async {
                ran.store(true, Ordering::SeqCst);
                Ok::<(), &'static str>(())
            })
            .await;
        assert!(matches!(result, Err(CircuitError::Rejected)));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn success_resets_consecutive_failures() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        fail(&breaker).await.unwrap_err();
        succeed(&breaker).await.unwrap();
        fail(&breaker).await.unwrap_err();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn ignored_errors_do_not_open() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60));
        for _ in 0..5 {
            let result = breaker
                .call_with(|_: &&str| false, async { Err::<(), _>("rejected") })
                .await;
            assert!(matches!(result, Err(CircuitError::Inner("rejected"))));
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn recovers_through_half_open() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        fail(&breaker).await.unwrap_err();
        assert_eq!(breaker.state(), CircuitState::Open);

        // Пробный запрос после паузы падает - цепь снова разомкнута
        tokio::time::sleep(Duration::from_millis(50)).await;
        fail(&breaker).await.unwrap_err();
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(50)).await;
        succeed(&breaker).await.unwrap();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
