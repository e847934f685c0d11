use chrono::{DateTime, Duration, NaiveDate, Utc};
use railbook_core::clock::Clock;
use railbook_core::gateway::{GatewayError, GatewayOutcome, PaymentGateway};
use railbook_core::session::SessionContext;
use railbook_core::supplier::{SeatSupplier, SupplierError};
use railbook_core::{Reject, RejectResult};
use railbook_domain::hold::Hold;
use railbook_domain::leg::{LegRef, PassengerType, ScheduleOption};
use railbook_domain::payment::{IntentOutcome, PaymentIntent};
use railbook_domain::reservation::{canonical_seat_id, Reservation};
use railbook_domain::trip::Trip;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::cart::{CartEntry, CheckoutReport};
use crate::holds::HoldBook;
use crate::payment::PaymentDesk;
use crate::reservations::ReservationLedger;
use crate::snapshot::SessionSnapshot;
use crate::trip::TripSequencer;
use crate::Cart;

/// Deadlines applied by the orchestrator. The backing supplier enforces its
/// own authoritative expiry; these drive the client-side view and sweeps.
#[derive(Debug, Clone)]
pub struct BookingRules {
    pub hold_ttl: Duration,
    pub payment_deadline: Duration,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            hold_ttl: Duration::minutes(10),
            payment_deadline: Duration::minutes(10),
        }
    }
}

/// All orchestrator state for one user session.
pub struct BookingSession {
    pub context: SessionContext,
    pub holds: HoldBook,
    pub ledger: ReservationLedger,
    pub cart: Cart,
    pub trip: TripSequencer,
    pub desk: PaymentDesk,
}

impl BookingSession {
    fn new(context: SessionContext) -> Self {
        Self {
            context,
            holds: HoldBook::new(),
            ledger: ReservationLedger::new(),
            cart: Cart::new(),
            trip: TripSequencer::new(),
            desk: PaymentDesk::new(),
        }
    }
}

/// Result of driving a payment intent to a terminal outcome.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResolution {
    pub intent_id: Uuid,
    pub order_id: String,
    pub amount_krw: i64,
    pub outcome: IntentOutcome,
    pub failure_reason: Option<String>,
}

/// Single logical actor per user session.
///
/// Each session sits behind a `tokio::sync::Mutex`, so operations issued
/// concurrently by the same session (an expiry sweep racing a payment
/// execute, say) serialize; different sessions proceed independently. Every
/// state-changing operation re-validates statuses under the lock rather than
/// trusting anything cached from before an await.
pub struct BookingEngine {
    supplier: Arc<dyn SeatSupplier>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    rules: BookingRules,
    sessions: RwLock<HashMap<String, Arc<Mutex<BookingSession>>>>,
}

impl BookingEngine {
    pub fn new(
        supplier: Arc<dyn SeatSupplier>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        rules: BookingRules,
    ) -> Self {
        Self {
            supplier,
            gateway,
            clock,
            rules,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn session(&self, ctx: &SessionContext) -> RejectResult<Arc<Mutex<BookingSession>>> {
        if !ctx.is_valid(self.clock.now()) {
            return Err(Reject::InvalidRequest("session token expired".to_string()));
        }
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&ctx.session_id) {
                return Ok(session.clone());
            }
        }
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .entry(ctx.session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(BookingSession::new(ctx.clone()))))
            .clone())
    }

    /// Release seats for everything that timed out. Advisory on our side;
    /// release failures are logged and left for the supplier's own TTL.
    async fn sweep(&self, session: &mut BookingSession) {
        let now = self.clock.now();
        for hold in session.holds.sweep_expired(now) {
            if let Err(e) = self.supplier.release_seats(&hold.leg, &hold.seat_ids).await {
                tracing::warn!(hold_id = %hold.id, error = %e, "seat release failed after hold expiry");
            }
        }
        for (leg, seat_ids) in session.ledger.sweep_expired(now) {
            if let Err(e) = self.supplier.release_seats(&leg, &seat_ids).await {
                tracing::warn!(error = %e, "seat release failed after payment deadline");
            }
        }
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Idempotent supplier read, retried at most once on transport failure.
    pub async fn search(
        &self,
        ctx: &SessionContext,
        leg: &LegRef,
        passenger_count: u32,
    ) -> RejectResult<Vec<ScheduleOption>> {
        self.session(ctx).await?;
        if passenger_count == 0 {
            return Err(Reject::InvalidRequest(
                "passenger count must be positive".to_string(),
            ));
        }
        match self.supplier.search(leg, passenger_count).await {
            Ok(options) => Ok(options),
            Err(SupplierError::Transport(detail)) => {
                tracing::warn!(%detail, "search transport failure, retrying once");
                self.supplier
                    .search(leg, passenger_count)
                    .await
                    .map_err(map_supplier_error)
            }
            Err(e) => Err(map_supplier_error(e)),
        }
    }

    // ------------------------------------------------------------------
    // Holds
    // ------------------------------------------------------------------

    pub async fn create_hold(
        &self,
        ctx: &SessionContext,
        leg: &LegRef,
        seat_ids: Vec<String>,
        passenger_types: Vec<PassengerType>,
    ) -> RejectResult<Hold> {
        let seat_ids: Vec<String> = seat_ids.iter().map(|s| canonical_seat_id(s)).collect();
        // Contract check before any network call.
        HoldBook::validate_request(&seat_ids, &passenger_types)?;

        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;
        // A dead trip resets here; the new hold may re-secure the outbound.
        let now = self.clock.now();
        {
            let BookingSession {
                trip, holds, ledger, ..
            } = &mut *session;
            if let Err(e) = trip.revalidate(holds, ledger, now) {
                tracing::debug!(reason = e.reason_code(), "trip reset during hold creation");
            }
        }

        self.hold_on_leg(&mut session, leg.clone(), seat_ids, passenger_types)
            .await
    }

    /// Shared hold-creation path for direct and trip-gated flows. Seat
    /// mutation is never auto-retried and never re-seats silently.
    async fn hold_on_leg(
        &self,
        session: &mut BookingSession,
        leg: LegRef,
        seat_ids: Vec<String>,
        passenger_types: Vec<PassengerType>,
    ) -> RejectResult<Hold> {
        match self
            .supplier
            .hold_seats(&leg, &seat_ids, self.rules.hold_ttl)
            .await
        {
            Ok(()) => {}
            Err(SupplierError::SeatsTaken { seat_ids }) => {
                tracing::debug!(?seat_ids, "seats taken by another party");
                return Err(Reject::SeatsUnavailable { seat_ids });
            }
            Err(e) => return Err(map_supplier_error(e)),
        }

        let now = self.clock.now();
        let hold = Hold::new(leg, seat_ids, passenger_types, now, self.rules.hold_ttl);
        session.holds.insert(hold.clone());
        session.trip.note_hold(&hold);
        tracing::info!(hold_id = %hold.id, expires = %hold.ttl_expiry, "hold created");
        Ok(hold)
    }

    /// Idempotent: cancelling an expired, converted, or unknown hold is a
    /// no-op success, so a user-initiated cancel can never race natural
    /// expiry into an error.
    pub async fn cancel_hold(&self, ctx: &SessionContext, hold_id: Uuid) -> RejectResult<()> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        if let Some(hold) = session.holds.cancel(hold_id) {
            if let Err(e) = self.supplier.release_seats(&hold.leg, &hold.seat_ids).await {
                tracing::warn!(hold_id = %hold_id, error = %e, "seat release failed on cancel");
            }
            tracing::info!(hold_id = %hold_id, "hold cancelled");
        }
        Ok(())
    }

    pub async fn hold_time_remaining(
        &self,
        ctx: &SessionContext,
        hold_id: Uuid,
    ) -> RejectResult<Duration> {
        let session = self.session(ctx).await?;
        let session = session.lock().await;
        session.holds.time_remaining(hold_id, self.clock.now())
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    /// Promote a hold into a payable reservation. One-way, one-time; the
    /// fare is quoted exactly once here and frozen. The session lock spans
    /// the whole operation, so no caller ever observes the hold active and
    /// the reservation existing at the same time.
    pub async fn convert(&self, ctx: &SessionContext, hold_id: Uuid) -> RejectResult<Reservation> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;

        let now = self.clock.now();
        let (leg, passenger_types) = {
            let hold = session.holds.active(hold_id, now)?;
            (hold.leg.clone(), hold.passenger_types.clone())
        };

        let fare_krw = self
            .supplier
            .quote_fare(&leg, &passenger_types)
            .await
            .map_err(map_supplier_error)?;

        let hold = session.holds.take_for_conversion(hold_id, self.clock.now())?;
        let deadline = self.clock.now() + self.rules.payment_deadline;
        let reservation = session
            .ledger
            .create_from_hold(&hold, fare_krw, deadline, self.clock.now());
        session.trip.note_conversion(hold_id, reservation.id);
        tracing::info!(
            reservation_id = %reservation.id,
            hold_id = %hold_id,
            fare_krw,
            "hold converted to reservation"
        );
        Ok(reservation)
    }

    /// Deadline-aware view of a reservation.
    pub async fn reservation(
        &self,
        ctx: &SessionContext,
        reservation_id: Uuid,
    ) -> RejectResult<Reservation> {
        let session = self.session(ctx).await?;
        let session = session.lock().await;
        let mut reservation = session.ledger.require(reservation_id)?.clone();
        reservation.status = reservation.effective_status(self.clock.now());
        Ok(reservation)
    }

    pub async fn cancel_reservation(
        &self,
        ctx: &SessionContext,
        reservation_id: Uuid,
    ) -> RejectResult<()> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        let now = self.clock.now();
        if let Some((leg, seat_ids)) = session.ledger.cancel(reservation_id, now)? {
            if let Err(e) = self.supplier.release_seats(&leg, &seat_ids).await {
                tracing::warn!(reservation_id = %reservation_id, error = %e, "seat release failed on reservation cancel");
            }
            tracing::info!(reservation_id = %reservation_id, "reservation cancelled");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cart
    // ------------------------------------------------------------------

    pub async fn cart_add(&self, ctx: &SessionContext, reservation_id: Uuid) -> RejectResult<()> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;
        let now = self.clock.now();
        let BookingSession { cart, ledger, .. } = &mut *session;
        cart.add(reservation_id, ledger, now)
    }

    pub async fn cart_remove(
        &self,
        ctx: &SessionContext,
        reservation_ids: &[Uuid],
    ) -> RejectResult<()> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        session.cart.remove(reservation_ids);
        Ok(())
    }

    pub async fn cart_remove_all(&self, ctx: &SessionContext) -> RejectResult<()> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        session.cart.remove_all();
        Ok(())
    }

    pub async fn cart_toggle(&self, ctx: &SessionContext, reservation_id: Uuid) -> RejectResult<()> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        session.cart.toggle_selection(reservation_id)
    }

    pub async fn cart_toggle_all(&self, ctx: &SessionContext) -> RejectResult<()> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        session.cart.toggle_all();
        Ok(())
    }

    /// Live entries and selected total, both recomputed now.
    pub async fn cart_view(
        &self,
        ctx: &SessionContext,
    ) -> RejectResult<(Vec<CartEntry>, i64)> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;
        let now = self.clock.now();
        let entries = session.cart.live_entries(&session.ledger, now);
        let total = session.cart.selected_total(&session.ledger, now);
        Ok((entries, total))
    }

    /// Checkout the selected entries into a payment intent. When entries
    /// went stale in the cart, the rejection lists exactly which ones, and
    /// the remainder stays in the cart for re-display.
    pub async fn cart_checkout(&self, ctx: &SessionContext) -> RejectResult<PaymentIntent> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;
        let now = self.clock.now();

        let BookingSession { cart, ledger, .. } = &mut *session;
        let CheckoutReport { ready, stale } = cart.checkout(ledger, now)?;
        if !stale.is_empty() {
            tracing::debug!(?stale, "cart entries expired before checkout");
            return Err(Reject::NotAwaitingPayment {
                reservation_ids: stale,
            });
        }
        self.prepare_locked(&mut session, ready).await
    }

    // ------------------------------------------------------------------
    // Payment
    // ------------------------------------------------------------------

    pub async fn prepare_payment(
        &self,
        ctx: &SessionContext,
        reservation_ids: Vec<Uuid>,
    ) -> RejectResult<PaymentIntent> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;
        self.prepare_locked(&mut session, reservation_ids).await
    }

    async fn prepare_locked(
        &self,
        session: &mut BookingSession,
        reservation_ids: Vec<Uuid>,
    ) -> RejectResult<PaymentIntent> {
        let now = self.clock.now();
        let amount = session
            .desk
            .validate_targets(&session.ledger, &reservation_ids, now)?;

        let order = self
            .gateway
            .prepare_order(amount)
            .await
            .map_err(map_gateway_error)?;
        if order.amount_krw != amount {
            return Err(Reject::StateCorruption(format!(
                "gateway registered amount {} for requested {}",
                order.amount_krw, amount
            )));
        }

        let intent = session
            .desk
            .register(order.order_id, reservation_ids, amount, self.clock.now());
        tracing::info!(intent_id = %intent.id, order_id = %intent.order_id, amount, "payment intent prepared");
        Ok(intent)
    }

    /// Drive a pending intent to a terminal outcome. Targets are re-validated
    /// under the session lock immediately before the gateway call, so an
    /// expiry timer firing mid-flight cannot let a stale reservation through.
    pub async fn execute_payment(
        &self,
        ctx: &SessionContext,
        intent_id: Uuid,
    ) -> RejectResult<PaymentResolution> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;

        let now = self.clock.now();
        let intent = {
            let BookingSession { desk, ledger, .. } = &mut *session;
            desk.revalidate_for_execute(ledger, intent_id, now)?
        };

        let outcome = match self.gateway.execute_order(&intent.order_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Discard rather than leave the targets blocked behind a
                // pending intent nobody can resolve.
                session.desk.resolve(intent_id, IntentOutcome::Discarded);
                return Err(map_gateway_error(e));
            }
        };

        let resolution = match outcome {
            GatewayOutcome::Paid => {
                // The charge went through. The record follows the money even
                // if the payment deadline lapsed during the gateway await.
                for rid in &intent.target_reservation_ids {
                    session.ledger.settle_paid(*rid);
                }
                session.desk.resolve(intent_id, IntentOutcome::Paid);
                tracing::info!(intent_id = %intent_id, amount = intent.amount_krw, "payment completed");
                PaymentResolution {
                    intent_id,
                    order_id: intent.order_id,
                    amount_krw: intent.amount_krw,
                    outcome: IntentOutcome::Paid,
                    failure_reason: None,
                }
            }
            GatewayOutcome::UserCancelled => {
                session.desk.resolve(intent_id, IntentOutcome::UserCancelled);
                // The user changed their mind; nothing alarming happened.
                tracing::debug!(intent_id = %intent_id, "payment cancelled by user");
                PaymentResolution {
                    intent_id,
                    order_id: intent.order_id,
                    amount_krw: intent.amount_krw,
                    outcome: IntentOutcome::UserCancelled,
                    failure_reason: None,
                }
            }
            GatewayOutcome::Failed(reason) => {
                session.desk.resolve(intent_id, IntentOutcome::Failed);
                tracing::debug!(intent_id = %intent_id, %reason, "payment failed, caller may retry");
                PaymentResolution {
                    intent_id,
                    order_id: intent.order_id,
                    amount_krw: intent.amount_krw,
                    outcome: IntentOutcome::Failed,
                    failure_reason: Some(reason),
                }
            }
        };
        Ok(resolution)
    }

    // ------------------------------------------------------------------
    // Round trips
    // ------------------------------------------------------------------

    pub async fn trip_begin(
        &self,
        ctx: &SessionContext,
        departure_station: String,
        arrival_station: String,
        outbound_date: NaiveDate,
        return_date: NaiveDate,
    ) -> RejectResult<Trip> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        session
            .trip
            .begin(departure_station, arrival_station, outbound_date, return_date)
    }

    pub async fn trip_current(&self, ctx: &SessionContext) -> RejectResult<Option<Trip>> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;
        let now = self.clock.now();
        let BookingSession {
            trip, holds, ledger, ..
        } = &mut *session;
        trip.revalidate(holds, ledger, now)?;
        Ok(trip.current().cloned())
    }

    /// Inbound-leg search, hard-gated on the outbound being secured.
    pub async fn trip_search_inbound(
        &self,
        ctx: &SessionContext,
        passenger_count: u32,
    ) -> RejectResult<Vec<ScheduleOption>> {
        let session = self.session(ctx).await?;
        let inbound_leg = {
            let mut session = session.lock().await;
            self.sweep(&mut session).await;
            let now = self.clock.now();
            let BookingSession {
                trip, holds, ledger, ..
            } = &mut *session;
            trip.revalidate(holds, ledger, now)?;
            trip.inbound_leg()?
        };
        self.search(ctx, &inbound_leg, passenger_count).await
    }

    /// Inbound-leg hold, same gate as inbound search.
    pub async fn trip_hold_inbound(
        &self,
        ctx: &SessionContext,
        train_no: String,
        seat_ids: Vec<String>,
        passenger_types: Vec<PassengerType>,
    ) -> RejectResult<Hold> {
        let seat_ids: Vec<String> = seat_ids.iter().map(|s| canonical_seat_id(s)).collect();
        HoldBook::validate_request(&seat_ids, &passenger_types)?;

        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;
        let now = self.clock.now();
        let BookingSession {
            trip, holds, ledger, ..
        } = &mut *session;
        trip.revalidate(holds, ledger, now)?;
        let mut leg = trip.inbound_leg()?;
        leg.train_no = train_no;

        self.hold_on_leg(&mut session, leg, seat_ids, passenger_types)
            .await
    }

    pub async fn trip_total_fare(&self, ctx: &SessionContext) -> RejectResult<i64> {
        let session = self.session(ctx).await?;
        let mut session = session.lock().await;
        self.sweep(&mut session).await;
        let now = self.clock.now();
        let BookingSession {
            trip, holds, ledger, ..
        } = &mut *session;
        trip.revalidate(holds, ledger, now)?;
        trip.total_fare(ledger)
    }

    // ------------------------------------------------------------------
    // Durability
    // ------------------------------------------------------------------

    /// Minimal durable record of the session: ids, statuses, and deadlines,
    /// enough to resume after a restart without re-deriving state from the UI.
    pub async fn snapshot(&self, ctx: &SessionContext) -> RejectResult<SessionSnapshot> {
        let session = self.session(ctx).await?;
        let session = session.lock().await;
        Ok(SessionSnapshot::capture(&session))
    }

    /// Restore is scoped to the caller's own session; a snapshot recorded for
    /// a different session id is rejected outright.
    pub async fn restore(
        &self,
        ctx: &SessionContext,
        snapshot: SessionSnapshot,
    ) -> RejectResult<()> {
        if ctx.session_id != snapshot.context.session_id {
            return Err(Reject::InvalidRequest(format!(
                "snapshot belongs to session {}, not {}",
                snapshot.context.session_id, ctx.session_id
            )));
        }
        let restored = snapshot.into_session();
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            restored.context.session_id.clone(),
            Arc::new(Mutex::new(restored)),
        );
        Ok(())
    }
}

fn map_supplier_error(e: SupplierError) -> Reject {
    match e {
        SupplierError::SeatsTaken { seat_ids } => Reject::SeatsUnavailable { seat_ids },
        SupplierError::UnknownLeg(detail) => Reject::InvalidRequest(format!("unknown leg: {detail}")),
        SupplierError::Transport(detail) => Reject::Upstream {
            service: "seat-supplier".to_string(),
            detail,
        },
    }
}

fn map_gateway_error(e: GatewayError) -> Reject {
    match e {
        GatewayError::Transport(detail) => Reject::Upstream {
            service: "payment-gateway".to_string(),
            detail,
        },
    }
}
