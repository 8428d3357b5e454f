//! Сценарий оформления для одного пользователя.
//!
//! ```text
//! Idle -> Selecting -> AwaitingPayment -> Submitting -> Confirmed
//!            ^               |                 |
//!            +---- истёк ----+---- ошибка -----+
//! ```
//!
//! На оплату даётся `hold` (по умолчанию 10 минут). Пока идёт оплата,
//! ничего не записывается: места не блокируются, бронь создаётся только
//! на шаге Submitting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{Booking, SeatCode, Session};
use crate::services::booking::{BookingRequest, BookingService};
use crate::services::pricing::PriceTable;
use crate::services::seat_map::{BookedSeats, SeatLayout, SeatSelection, Toggled};

pub const DEFAULT_HOLD_MINUTES: i64 = 10;
pub const HALF_PRICE_COUPON: &str = "MOVIE50";

/// Сумма к оплате после купона. Записанная в бронь цена остаётся полной.
pub fn discounted(total: i32, coupon: &str) -> Option<i32> {
    if coupon.trim().eq_ignore_ascii_case(HALF_PRICE_COUPON) {
        Some(total.div_euclid(2))
    } else {
        None
    }
}

/// Ожидание оплаты: что выбрано, сколько стоит и до какого момента.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutHold {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub seats: Vec<SeatCode>,
    pub total_price: i32,
    pub amount_due: i32,
    pub coupon: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CheckoutHold {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    pub fn apply_coupon(&mut self, code: &str) -> Result<i32, BookingError> {
        if self.coupon.is_some() {
            return Err(BookingError::InvalidState("coupon already applied"));
        }
        let amount = discounted(self.total_price, code)
            .ok_or_else(|| BookingError::InvalidCoupon(code.to_string()))?;
        self.amount_due = amount;
        self.coupon = Some(code.trim().to_ascii_uppercase());
        Ok(amount)
    }

    pub fn to_request(&self) -> BookingRequest {
        BookingRequest {
            showtime_id: self.showtime_id,
            seats: self.seats.iter().map(|s| s.to_string()).collect(),
            total_price: self.total_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    Selecting,
    AwaitingPayment(CheckoutHold),
    Submitting(CheckoutHold),
    Confirmed(Booking),
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::Selecting => "selecting",
            CheckoutState::AwaitingPayment(_) => "awaiting_payment",
            CheckoutState::Submitting(_) => "submitting",
            CheckoutState::Confirmed(_) => "confirmed",
        }
    }
}

pub struct Checkout {
    showtime_id: Uuid,
    prices: PriceTable,
    hold: Duration,
    booked: BookedSeats,
    selection: SeatSelection,
    state: CheckoutState,
}

impl Checkout {
    pub fn new(
        showtime_id: Uuid,
        layout: SeatLayout,
        max_seats: usize,
        prices: PriceTable,
        hold: Duration,
    ) -> Self {
        Self {
            showtime_id,
            prices,
            hold,
            booked: BookedSeats::new(),
            selection: SeatSelection::new(layout, max_seats),
            state: CheckoutState::Idle,
        }
    }

    /// Оформление целиком со стороны сервера: свежий снимок занятых мест,
    /// выбор из запроса и переход к оплате. Места проверяются так же, как
    /// при прямой брони, поэтому повтор места - `DuplicateSeat`.
    pub async fn start(
        service: &BookingService,
        showtime_id: Uuid,
        seats: &[String],
        hold: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, BookingError> {
        let seats = service.validate_seats(seats)?;
        let showtime = service.find_showtime(showtime_id).await?;
        let prices = service.prices_for(&showtime).await?;
        let booked = service.booked_seats(showtime.id).await?;

        let mut checkout = Self::new(
            showtime.id,
            service.layout(),
            service.max_seats(),
            prices,
            hold,
        );
        checkout.open(booked)?;
        for seat in seats {
            checkout.toggle(seat)?;
        }
        checkout.proceed(now)?;
        Ok(checkout)
    }

    /// Ожидающий оплаты заказ, если он есть.
    pub fn hold(&self) -> Option<&CheckoutHold> {
        match &self.state {
            CheckoutState::AwaitingPayment(hold) => Some(hold),
            _ => None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn selection(&self) -> &SeatSelection {
        &self.selection
    }

    pub fn booked(&self) -> &BookedSeats {
        &self.booked
    }

    pub fn total(&self) -> i32 {
        self.selection.total(&self.prices)
    }

    /// Открыть схему зала со снимком занятых мест.
    pub fn open(&mut self, booked: BookedSeats) -> Result<(), BookingError> {
        match self.state {
            CheckoutState::Idle | CheckoutState::Selecting => {
                self.booked = booked;
                self.selection.drop_booked(&self.booked);
                self.state = CheckoutState::Selecting;
                Ok(())
            }
            _ => Err(BookingError::InvalidState("checkout already in progress")),
        }
    }

    pub fn toggle(&mut self, seat: SeatCode) -> Result<Toggled, BookingError> {
        if self.state != CheckoutState::Selecting {
            return Err(BookingError::InvalidState("seats can only be changed while selecting"));
        }
        Ok(self.selection.toggle(seat, &self.booked)?)
    }

    /// Перейти к оплате: фиксируем выбор и сумму на время `hold`.
    pub fn proceed(&mut self, now: DateTime<Utc>) -> Result<&CheckoutHold, BookingError> {
        if self.state != CheckoutState::Selecting {
            return Err(BookingError::InvalidState("nothing to pay for"));
        }
        if self.selection.is_empty() {
            return Err(BookingError::EmptySelection);
        }

        let total = self.total();
        self.state = CheckoutState::AwaitingPayment(CheckoutHold {
            id: Uuid::new_v4(),
            showtime_id: self.showtime_id,
            seats: self.selection.seats().to_vec(),
            total_price: total,
            amount_due: total,
            coupon: None,
            expires_at: now + self.hold,
        });
        match &self.state {
            CheckoutState::AwaitingPayment(hold) => Ok(hold),
            _ => Err(BookingError::InvalidState("nothing to pay for")),
        }
    }

    pub fn apply_coupon(&mut self, code: &str) -> Result<i32, BookingError> {
        match &mut self.state {
            CheckoutState::AwaitingPayment(hold) => hold.apply_coupon(code),
            _ => Err(BookingError::InvalidState("no payment in progress")),
        }
    }

    /// Закрыть окно оплаты и вернуться к выбору мест.
    pub fn cancel_payment(&mut self) -> Result<(), BookingError> {
        match self.state {
            CheckoutState::AwaitingPayment(_) => {
                self.state = CheckoutState::Selecting;
                Ok(())
            }
            _ => Err(BookingError::InvalidState("no payment in progress")),
        }
    }

    /// Истекло время оплаты - назад к выбору, ничего не записано.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        let expired = matches!(&self.state, CheckoutState::AwaitingPayment(hold) if hold.is_expired(now));
        if expired {
            info!("Checkout for showtime {} expired", self.showtime_id);
            self.state = CheckoutState::Selecting;
        }
        expired
    }

    /// Оплата прошла: переходим в Submitting и отдаём запрос на бронь.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Result<BookingRequest, BookingError> {
        if self.expire_if_due(now) {
            return Err(BookingError::CheckoutExpired);
        }
        let hold = match std::mem::replace(&mut self.state, CheckoutState::Selecting) {
            CheckoutState::AwaitingPayment(hold) => hold,
            other => {
                self.state = other;
                return Err(BookingError::InvalidState("no payment in progress"));
            }
        };
        let request = hold.to_request();
        self.state = CheckoutState::Submitting(hold);
        Ok(request)
    }

    /// Итог записи брони. При конфликте занятые места переносятся в снимок
    /// и убираются из выбора; при любой ошибке возвращаемся к выбору.
    pub fn finish(&mut self, outcome: Result<Booking, BookingError>) -> Result<&Booking, BookingError> {
        if !matches!(self.state, CheckoutState::Submitting(_)) {
            return Err(BookingError::InvalidState("no booking is being submitted"));
        }

        match outcome {
            Ok(booking) => {
                self.state = CheckoutState::Confirmed(booking);
                match &self.state {
                    CheckoutState::Confirmed(booking) => Ok(booking),
                    _ => Err(BookingError::InvalidState("no booking is being submitted")),
                }
            }
            Err(err) => {
                if let BookingError::SeatConflict(taken) = &err {
                    self.booked
                        .extend(taken.iter().filter_map(|code| code.parse::<SeatCode>().ok()));
                    self.selection.drop_booked(&self.booked);
                }
                self.state = CheckoutState::Selecting;
                Err(err)
            }
        }
    }

    /// Полный шаг оплаты против сервиса бронирования.
    pub async fn submit(
        &mut self,
        service: &BookingService,
        session: Option<&Session>,
        now: DateTime<Utc>,
    ) -> Result<&Booking, BookingError> {
        let request = self.begin_submit(now)?;
        let outcome = service.submit_booking(session, request).await;
        self.finish(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coupon_halves_with_floor() {
        assert_eq!(discounted(670, "MOVIE50"), Some(335));
        assert_eq!(discounted(675, "movie50"), Some(337));
        assert_eq!(discounted(670, "FREE"), None);
    }
}
