//! Схема зала и выбор мест.
//!
//! Геометрия фиксирована: ряды `A..`, в каждом ряду два блока по
//! `seats_per_side` мест через проход. Класс места зависит только от буквы
//! ряда (см. [`Tier::for_row`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::models::{SeatCode, Tier};
use crate::services::pricing::PriceTable;

pub const DEFAULT_ROWS: u8 = 7;
pub const DEFAULT_SEATS_PER_SIDE: u8 = 9;
pub const DEFAULT_MAX_SELECTABLE: usize = 6;

/// Снимок занятых мест сеанса. Читается один раз перед выбором.
pub type BookedSeats = BTreeSet<SeatCode>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatLayout {
    pub rows: u8,
    pub seats_per_side: u8,
}

impl Default for SeatLayout {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            seats_per_side: DEFAULT_SEATS_PER_SIDE,
        }
    }
}

impl SeatLayout {
    pub fn new(rows: u8, seats_per_side: u8) -> Self {
        // Больше 26 рядов буквами не подписать
        Self {
            rows: rows.min(26),
            seats_per_side,
        }
    }

    pub fn row_labels(&self) -> impl Iterator<Item = char> {
        (0..self.rows).map(|i| (b'A' + i) as char)
    }

    pub fn seats_per_row(&self) -> u16 {
        self.seats_per_side as u16 * 2
    }

    /// Сетка мест по рядам: левый блок `1..=n`, правый `n+1..=2n`.
    pub fn build(&self) -> Vec<Vec<SeatCode>> {
        self.row_labels()
            .map(|row| {
                (1..=self.seats_per_row())
                    .filter_map(|number| u8::try_from(number).ok())
                    .filter_map(|number| SeatCode::new(row, number).ok())
                    .collect()
            })
            .collect()
    }

    pub fn contains(&self, seat: &SeatCode) -> bool {
        let last_row = (b'A' + self.rows.saturating_sub(1)) as char;
        self.rows > 0
            && seat.row() <= last_row
            && u16::from(seat.number()) <= self.seats_per_row()
    }

    /// Место в правом блоке (после прохода).
    pub fn is_right_of_aisle(&self, seat: &SeatCode) -> bool {
        seat.number() > self.seats_per_side
    }
}

pub fn is_available(seat: &SeatCode, booked: &BookedSeats) -> bool {
    !booked.contains(seat)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionRejected {
    #[error("seat {0} is already booked")]
    AlreadyBooked(SeatCode),
    #[error("you can only select up to {0} seats")]
    LimitReached(usize),
    #[error("seat {0} does not exist in this hall")]
    OutOfLayout(SeatCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Selected,
    Deselected,
}

/// Выбранные пользователем места в порядке выбора.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSelection {
    layout: SeatLayout,
    max_selectable: usize,
    seats: Vec<SeatCode>,
}

impl SeatSelection {
    pub fn new(layout: SeatLayout, max_selectable: usize) -> Self {
        Self {
            layout,
            max_selectable,
            seats: Vec::new(),
        }
    }

    pub fn seats(&self) -> &[SeatCode] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn contains(&self, seat: &SeatCode) -> bool {
        self.seats.contains(seat)
    }

    /// Переключает место. При отказе выбор не меняется.
    pub fn toggle(&mut self, seat: SeatCode, booked: &BookedSeats) -> Result<Toggled, SelectionRejected> {
        if !self.layout.contains(&seat) {
            return Err(SelectionRejected::OutOfLayout(seat));
        }
        if !is_available(&seat, booked) {
            return Err(SelectionRejected::AlreadyBooked(seat));
        }

        if let Some(pos) = self.seats.iter().position(|s| *s == seat) {
            self.seats.remove(pos);
            return Ok(Toggled::Deselected);
        }

        if self.seats.len() >= self.max_selectable {
            return Err(SelectionRejected::LimitReached(self.max_selectable));
        }
        self.seats.push(seat);
        Ok(Toggled::Selected)
    }

    /// Убирает из выбора места, которые оказались заняты.
    pub fn drop_booked(&mut self, booked: &BookedSeats) -> Vec<SeatCode> {
        let (lost, kept): (Vec<SeatCode>, Vec<SeatCode>) =
            self.seats.iter().copied().partition(|s| booked.contains(s));
        self.seats = kept;
        lost
    }

    pub fn total(&self, prices: &PriceTable) -> i32 {
        prices.total(&self.seats)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Booked,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatView {
    pub code: SeatCode,
    pub tier: Tier,
    pub status: SeatStatus,
    pub price: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatRowView {
    pub label: char,
    pub left: Vec<SeatView>,
    pub right: Vec<SeatView>,
}

/// Схема зала с отметками занятых мест - то, что рисует клиент.
#[derive(Debug, Clone, Serialize)]
pub struct SeatMapView {
    pub layout: SeatLayout,
    pub prices: PriceTable,
    pub rows: Vec<SeatRowView>,
    pub booked_count: usize,
}

impl SeatMapView {
    pub fn render(layout: SeatLayout, prices: PriceTable, booked: &BookedSeats) -> Self {
        let rows = layout
            .build()
            .into_iter()
            .zip(layout.row_labels())
            .map(|(seats, label)| {
                let (left, right): (Vec<_>, Vec<_>) = seats
                    .into_iter()
                    .map(|code| SeatView {
                        code,
                        tier: code.tier(),
                        status: if is_available(&code, booked) {
                            SeatStatus::Available
                        } else {
                            SeatStatus::Booked
                        },
                        price: prices.price(code.tier()),
                    })
                    .partition(|view| !layout.is_right_of_aisle(&view.code));
                SeatRowView { label, left, right }
            })
            .collect();

        Self {
            layout,
            prices,
            rows,
            booked_count: booked.iter().filter(|s| layout.contains(s)).count(),
        }
    }
}
