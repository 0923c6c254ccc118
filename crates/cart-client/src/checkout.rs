//! # Checkout Orchestrator
//!
//! Drives one payment attempt for one order:
//!
//! ```text
//! Uninitialized ──start──▶ IntentPending ──secret──▶ IntentReady ──submit──▶ Submitting
//!                               │                      ▲     │                 │
//!                               │ error                │     │ form invalid    ├─ succeeded ─▶ Succeeded
//!                               ▼                      │     ▼                 ├─ processing / requires_action (stay)
//!                             Failed                   └─────┘                 └─ error ─────▶ Failed
//! ```
//!
//! Success is only ever recognised from a `succeeded` intent status. The
//! orchestrator never retries on its own.

use async_trait::async_trait;
use cart_core::{
    BoxedPaymentCapability, IntentStatus, PaymentIntent, PaymentSession, PaymentStatus, ShopError,
    ShopResult,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Default pause between a succeeded payment and `on_success`
pub const DEFAULT_SUCCESS_GRACE: Duration = Duration::from_millis(1500);

/// Where payment intents come from (the shop API in production)
#[async_trait]
pub trait PaymentIntentSource: Send + Sync {
    /// Client secret of the intent for `order_id`
    async fn create_intent(&self, order_id: &str) -> ShopResult<String>;
}

/// Hooks the UI provides to react to the end of a checkout attempt
pub trait CheckoutCallbacks: Send + Sync {
    /// Payment succeeded; called once, after the grace delay
    fn on_success(&self, intent: &PaymentIntent);

    /// No intent could be obtained; the checkout screen should be left
    fn on_cancel(&self, error: &ShopError);
}

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Uninitialized,
    IntentPending,
    IntentReady,
    Submitting,
    Succeeded,
    Failed,
}

impl CheckoutState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Succeeded | CheckoutState::Failed)
    }
}

/// Result of a submission that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Payment succeeded and `on_success` has fired
    Succeeded(PaymentIntent),
    /// The shopper or the bank still has to act; still `Submitting`
    Pending(PaymentIntent),
}

#[derive(Debug)]
struct Attempt {
    state: CheckoutState,
    session: PaymentSession,
    last_error: Option<String>,
}

/// Orchestrates a single checkout attempt
pub struct CheckoutOrchestrator {
    intents: Arc<dyn PaymentIntentSource>,
    capability: BoxedPaymentCapability,
    callbacks: Arc<dyn CheckoutCallbacks>,
    return_base: String,
    success_grace: Duration,
    attempt: Mutex<Attempt>,
    closed: CancellationToken,
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("provider", &self.capability.provider_name())
            .field("return_base", &self.return_base)
            .field("success_grace", &self.success_grace)
            .finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    pub fn new(
        intents: Arc<dyn PaymentIntentSource>,
        capability: BoxedPaymentCapability,
        callbacks: Arc<dyn CheckoutCallbacks>,
        return_base: impl Into<String>,
    ) -> Self {
        Self {
            intents,
            capability,
            callbacks,
            return_base: return_base.into().trim_end_matches('/').to_string(),
            success_grace: DEFAULT_SUCCESS_GRACE,
            attempt: Mutex::new(Attempt {
                state: CheckoutState::Uninitialized,
                session: PaymentSession::new(),
                last_error: None,
            }),
            closed: CancellationToken::new(),
        }
    }

    /// Builder: pause before `on_success` (zero disables it)
    pub fn with_success_grace(mut self, grace: Duration) -> Self {
        self.success_grace = grace;
        self
    }

    pub async fn state(&self) -> CheckoutState {
        self.attempt.lock().await.state
    }

    pub async fn session(&self) -> PaymentSession {
        self.attempt.lock().await.session.clone()
    }

    /// Message from the most recent failure, for display
    pub async fn last_error(&self) -> Option<String> {
        self.attempt.lock().await.last_error.clone()
    }

    /// URL the processor returns the shopper to after out-of-band auth
    pub fn return_url(&self, order_id: &str) -> String {
        format!("{}/order/{}/payment-complete", self.return_base, order_id)
    }

    /// Stop waiting on anything in flight; later results are discarded and
    /// no callback fires
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Obtain the payment intent for `order_id`.
    ///
    /// On failure the attempt is `Failed` and `on_cancel` fires.
    #[instrument(skip(self))]
    pub async fn start(&self, order_id: &str) -> ShopResult<()> {
        {
            let mut attempt = self.attempt.lock().await;
            if attempt.state != CheckoutState::Uninitialized {
                return Err(ShopError::InvalidState(format!(
                    "checkout already started ({:?})",
                    attempt.state
                )));
            }
            attempt.state = CheckoutState::IntentPending;
            attempt.session.order_id = Some(order_id.to_string());
            attempt.session.status = PaymentStatus::Pending;
        }

        let result = self.unless_closed(self.intents.create_intent(order_id)).await?;

        let mut attempt = self.attempt.lock().await;
        match result {
            Ok(client_secret) => {
                attempt.session.client_secret = Some(client_secret);
                attempt.state = CheckoutState::IntentReady;
                info!("Payment intent ready: attempt={}", attempt.session.attempt_id);
                Ok(())
            }
            Err(e) => {
                warn!("Could not obtain payment intent: {}", e);
                attempt.state = CheckoutState::Failed;
                attempt.session.status = PaymentStatus::Failed;
                attempt.last_error = Some(e.user_message());
                drop(attempt);
                self.callbacks.on_cancel(&e);
                Err(e)
            }
        }
    }

    /// Submit the payment.
    ///
    /// An invalid card form returns the attempt to `IntentReady` without any
    /// network call.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> ShopResult<SubmitOutcome> {
        let (client_secret, order_id) = {
            let mut attempt = self.attempt.lock().await;
            if attempt.state != CheckoutState::IntentReady {
                return Err(ShopError::InvalidState(format!(
                    "cannot submit while {:?}",
                    attempt.state
                )));
            }
            let (Some(secret), Some(order_id)) = (
                attempt.session.client_secret.clone(),
                attempt.session.order_id.clone(),
            ) else {
                return Err(ShopError::Internal("intent ready without a client secret".into()));
            };
            attempt.state = CheckoutState::Submitting;
            attempt.last_error = None;
            (secret, order_id)
        };

        if let Err(e) = self.unless_closed(self.capability.collect_details()).await? {
            let mut attempt = self.attempt.lock().await;
            if !self.is_closed() {
                attempt.state = CheckoutState::IntentReady;
                attempt.last_error = Some(e.user_message());
            }
            return Err(e);
        }

        let return_url = self.return_url(&order_id);
        let result = self
            .unless_closed(self.capability.confirm(&client_secret, &return_url))
            .await?;

        self.resolve(result).await
    }

    /// Re-check a pending intent with the processor
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> ShopResult<SubmitOutcome> {
        let client_secret = {
            let attempt = self.attempt.lock().await;
            match (attempt.state, attempt.session.client_secret.clone()) {
                (CheckoutState::Submitting, Some(secret)) => secret,
                (state, _) => {
                    return Err(ShopError::InvalidState(format!(
                        "nothing to refresh while {:?}",
                        state
                    )))
                }
            }
        };

        let result = self
            .unless_closed(self.capability.retrieve(&client_secret))
            .await?;

        self.resolve(result).await
    }

    /// Apply a confirm/retrieve result to a `Submitting` attempt
    async fn resolve(&self, result: ShopResult<PaymentIntent>) -> ShopResult<SubmitOutcome> {
        let mut attempt = self.attempt.lock().await;
        if self.is_closed() {
            return Err(ShopError::Cancelled);
        }

        let intent = match result {
            Ok(intent) => intent,
            Err(e) => {
                warn!("Payment confirmation failed: {}", e);
                attempt.state = CheckoutState::Failed;
                attempt.session.status = PaymentStatus::Failed;
                attempt.last_error = Some(e.user_message());
                return Err(e);
            }
        };

        if intent.status.is_in_flight() {
            info!("Payment {} still in flight: {:?}", intent.id, intent.status);
            attempt.session.status = PaymentStatus::Processing;
            return Ok(SubmitOutcome::Pending(intent));
        }

        if intent.status != IntentStatus::Succeeded {
            let message = intent
                .last_error
                .clone()
                .unwrap_or_else(|| "Payment failed. Please try again.".to_string());
            warn!("Payment {} ended as {:?}", intent.id, intent.status);
            attempt.state = CheckoutState::Failed;
            attempt.session.status = PaymentStatus::Failed;
            attempt.last_error = Some(message.clone());
            return Err(ShopError::payment(message));
        }

        attempt.state = CheckoutState::Succeeded;
        attempt.session.status = PaymentStatus::Succeeded;
        info!("Payment {} succeeded", intent.id);
        drop(attempt);

        if !self.success_grace.is_zero() {
            self.unless_closed(tokio::time::sleep(self.success_grace))
                .await?;
        }
        self.callbacks.on_success(&intent);
        Ok(SubmitOutcome::Succeeded(intent))
    }

    /// Await `fut` unless `close()` is called first
    async fn unless_closed<F: Future>(&self, fut: F) -> ShopResult<F::Output> {
        tokio::select! {
            _ = self.closed.cancelled() => Err(ShopError::Cancelled),
            output = fut => {
                if self.is_closed() {
                    Err(ShopError::Cancelled)
                } else {
                    Ok(output)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    struct FakeIntents {
        secret: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PaymentIntentSource for FakeIntents {
        async fn create_intent(&self, _order_id: &str) -> ShopResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.secret
                .clone()
                .ok_or_else(|| ShopError::api(500, Some("Could not create payment".into())))
        }
    }

    #[derive(Default)]
    struct FakeCard {
        form_error: StdMutex<Option<String>>,
        confirm_status: StdMutex<Option<IntentStatus>>,
        retrieve_status: StdMutex<Option<IntentStatus>>,
        confirm_calls: AtomicUsize,
        return_urls: StdMutex<Vec<String>>,
    }

    fn intent(status: IntentStatus) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".into(),
            status,
            amount: 12000,
            currency: "inr".into(),
            last_error: None,
        }
    }

    #[async_trait]
    impl cart_core::PaymentCapability for FakeCard {
        async fn collect_details(&self) -> ShopResult<()> {
            match self.form_error.lock().unwrap().clone() {
                Some(message) => Err(ShopError::Validation(message)),
                None => Ok(()),
            }
        }

        async fn confirm(&self, _secret: &str, return_url: &str) -> ShopResult<PaymentIntent> {
            self.confirm_calls.fetch_add(1, Ordering::SeqCst);
            self.return_urls.lock().unwrap().push(return_url.to_string());
            match self.confirm_status.lock().unwrap().clone() {
                Some(status) => Ok(intent(status)),
                None => Err(ShopError::Payment {
                    message: "Your card was declined.".into(),
                    code: Some("card_declined".into()),
                }),
            }
        }

        async fn retrieve(&self, _secret: &str) -> ShopResult<PaymentIntent> {
            let status = self
                .retrieve_status
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(IntentStatus::Processing);
            Ok(intent(status))
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    #[derive(Default)]
    struct Recorder {
        successes: StdMutex<Vec<PaymentIntent>>,
        cancels: StdMutex<Vec<String>>,
    }

    impl CheckoutCallbacks for Recorder {
        fn on_success(&self, intent: &PaymentIntent) {
            self.successes.lock().unwrap().push(intent.clone());
        }

        fn on_cancel(&self, error: &ShopError) {
            self.cancels.lock().unwrap().push(error.user_message());
        }
    }

    struct Harness {
        intents: Arc<FakeIntents>,
        card: Arc<FakeCard>,
        recorder: Arc<Recorder>,
        checkout: Arc<CheckoutOrchestrator>,
    }

    fn harness(secret: Option<&str>, confirm: Option<IntentStatus>, grace: Duration) -> Harness {
        let intents = Arc::new(FakeIntents {
            secret: secret.map(String::from),
            calls: AtomicUsize::new(0),
        });
        let card = Arc::new(FakeCard::default());
        *card.confirm_status.lock().unwrap() = confirm;
        let recorder = Arc::new(Recorder::default());
        let checkout = Arc::new(
            CheckoutOrchestrator::new(
                intents.clone(),
                card.clone(),
                recorder.clone(),
                "https://shop.example/",
            )
            .with_success_grace(grace),
        );
        Harness {
            intents,
            card,
            recorder,
            checkout,
        }
    }

    #[tokio::test]
    async fn test_intent_failure_cancels_once() {
        let h = harness(None, Some(IntentStatus::Succeeded), Duration::ZERO);

        let err = h.checkout.start("o1").await.unwrap_err();
        assert_eq!(err.user_message(), "Could not create payment");
        assert_eq!(h.checkout.state().await, CheckoutState::Failed);
        assert_eq!(h.recorder.cancels.lock().unwrap().len(), 1);

        assert!(matches!(
            h.checkout.submit().await,
            Err(ShopError::InvalidState(_))
        ));
        assert_eq!(h.card.confirm_calls.load(Ordering::SeqCst), 0);
        assert!(h.recorder.successes.lock().unwrap().is_empty());
        assert_eq!(h.intents.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let h = harness(Some("pi_1_secret_x"), None, Duration::ZERO);
        h.checkout.start("o1").await.unwrap();

        assert_eq!(h.checkout.state().await, CheckoutState::IntentReady);
        assert!(matches!(
            h.checkout.start("o1").await,
            Err(ShopError::InvalidState(_))
        ));
        assert_eq!(h.intents.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_fires_after_grace() {
        let h = harness(
            Some("pi_1_secret_x"),
            Some(IntentStatus::Succeeded),
            Duration::from_millis(1500),
        );
        h.checkout.start("o42").await.unwrap();

        let checkout = h.checkout.clone();
        let submit = tokio::spawn(async move { checkout.submit().await });

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(h.checkout.state().await, CheckoutState::Succeeded);
        assert!(h.recorder.successes.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        let outcome = submit.await.unwrap().unwrap();

        assert_eq!(outcome, SubmitOutcome::Succeeded(intent(IntentStatus::Succeeded)));
        let successes = h.recorder.successes.lock().unwrap();
        assert_eq!(successes.len(), 1);
        assert_eq!(successes[0], intent(IntentStatus::Succeeded));
        assert_eq!(
            h.card.return_urls.lock().unwrap()[0],
            "https://shop.example/order/o42/payment-complete"
        );
        assert_eq!(h.checkout.session().await.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_requires_action_stays_submitting() {
        let h = harness(
            Some("pi_1_secret_x"),
            Some(IntentStatus::RequiresAction),
            Duration::ZERO,
        );
        h.checkout.start("o1").await.unwrap();

        let outcome = h.checkout.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Pending(_)));
        assert_eq!(h.checkout.state().await, CheckoutState::Submitting);
        assert!(h.recorder.successes.lock().unwrap().is_empty());
        assert!(h.recorder.cancels.lock().unwrap().is_empty());

        *h.card.retrieve_status.lock().unwrap() = Some(IntentStatus::Succeeded);
        let outcome = h.checkout.refresh().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));
        assert_eq!(h.recorder.successes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_returns_to_ready() {
        let h = harness(Some("pi_1_secret_x"), Some(IntentStatus::Succeeded), Duration::ZERO);
        h.checkout.start("o1").await.unwrap();
        *h.card.form_error.lock().unwrap() = Some("Your card number is incomplete.".into());

        let err = h.checkout.submit().await.unwrap_err();
        assert!(matches!(err, ShopError::Validation(_)));
        assert_eq!(h.checkout.state().await, CheckoutState::IntentReady);
        assert_eq!(h.card.confirm_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.checkout.last_error().await.as_deref(),
            Some("Your card number is incomplete.")
        );

        *h.card.form_error.lock().unwrap() = None;
        assert!(h.checkout.submit().await.is_ok());
        assert_eq!(h.checkout.state().await, CheckoutState::Succeeded);
    }

    #[tokio::test]
    async fn test_decline_fails_without_retry() {
        let h = harness(Some("pi_1_secret_x"), None, Duration::ZERO);
        h.checkout.start("o1").await.unwrap();

        let err = h.checkout.submit().await.unwrap_err();
        assert_eq!(err.user_message(), "Your card was declined.");
        assert_eq!(h.checkout.state().await, CheckoutState::Failed);
        assert_eq!(h.card.confirm_calls.load(Ordering::SeqCst), 1);
        assert!(h.recorder.successes.lock().unwrap().is_empty());
        assert!(h.checkout.submit().await.is_err());
        assert_eq!(h.card.confirm_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsuccessful_status_is_failure() {
        let h = harness(
            Some("pi_1_secret_x"),
            Some(IntentStatus::RequiresPaymentMethod),
            Duration::ZERO,
        );
        h.checkout.start("o1").await.unwrap();

        assert!(matches!(
            h.checkout.submit().await,
            Err(ShopError::Payment { .. })
        ));
        assert_eq!(h.checkout.state().await, CheckoutState::Failed);
        assert_eq!(h.checkout.session().await.status, PaymentStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_suppresses_success_callback() {
        let h = harness(
            Some("pi_1_secret_x"),
            Some(IntentStatus::Succeeded),
            Duration::from_millis(1500),
        );
        h.checkout.start("o1").await.unwrap();

        let checkout = h.checkout.clone();
        let submit = tokio::spawn(async move { checkout.submit().await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        h.checkout.close();

        assert!(matches!(submit.await.unwrap(), Err(ShopError::Cancelled)));
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(h.recorder.successes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_before_intent_arrives() {
        let h = harness(Some("pi_1_secret_x"), None, Duration::ZERO);
        h.checkout.close();

        assert!(matches!(h.checkout.start("o1").await, Err(ShopError::Cancelled)));
        assert!(h.recorder.cancels.lock().unwrap().is_empty());
        assert_eq!(h.checkout.state().await, CheckoutState::IntentPending);
    }
}
