//! Детерминированная цена билета по ключу фильма.
//!
//! Цена пересчитывается и при отрисовке схемы зала, и при оформлении брони,
//! поэтому функция обязана быть чистой: один ключ и класс - одна цена.

use serde::{Deserialize, Serialize};

use crate::models::{SeatCode, Showtime, Tier};

/// Цена по умолчанию для пустого ключа и признак "цена не задана" у сеанса.
pub const DEFAULT_STANDARD_PRICE: i32 = 250;
pub const DEFAULT_VIP_PRICE: i32 = 400;

const STANDARD_RANGE: (i32, i32) = (180, 320);
const VIP_RANGE: (i32, i32) = (350, 600);

/// Полиномиальный хеш `hash * 31 + c` по UTF-16 кодам в 32-битной арифметике.
fn rolling_hash(key: &str) -> i32 {
    key.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

pub fn round_up_to_ten(value: i32) -> i32 {
    (value + 9).div_euclid(10) * 10
}

/// Цена места класса `tier` для фильма с ключом `movie_key`.
///
/// Результат кратен 10: standard в пределах 180..=320, vip - 350..=600
/// (верхняя граница достижима из-за округления вверх).
pub fn derive_price(movie_key: &str, tier: Tier) -> i32 {
    if movie_key.is_empty() {
        return match tier {
            Tier::Standard => DEFAULT_STANDARD_PRICE,
            Tier::Vip => DEFAULT_VIP_PRICE,
        };
    }

    let (min, max) = match tier {
        Tier::Standard => STANDARD_RANGE,
        Tier::Vip => VIP_RANGE,
    };
    let normalized = (rolling_hash(movie_key) % (max - min)).abs() + min;
    round_up_to_ten(normalized)
}

/// Цены сеанса по классам мест.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub standard: i32,
    pub vip: i32,
}

impl PriceTable {
    pub fn derived(movie_key: &str) -> Self {
        Self {
            standard: derive_price(movie_key, Tier::Standard),
            vip: derive_price(movie_key, Tier::Vip),
        }
    }

    /// Цены из сеанса; если у сеанса заглушка (250 или 0) - считаем по ключу фильма.
    pub fn for_showtime(showtime: &Showtime, movie_key: &str) -> Self {
        let derived = Self::derived(movie_key);
        let placeholder = showtime.price_standard == DEFAULT_STANDARD_PRICE
            || showtime.price_standard == 0;
        if placeholder {
            return derived;
        }
        Self {
            standard: showtime.price_standard,
            vip: if showtime.price_vip != 0 {
                showtime.price_vip
            } else {
                derived.vip
            },
        }
    }

    pub fn price(&self, tier: Tier) -> i32 {
        match tier {
            Tier::Standard => self.standard,
            Tier::Vip => self.vip,
        }
    }

    pub fn total<'a>(&self, seats: impl IntoIterator<Item = &'a SeatCode>) -> i32 {
        seats.into_iter().map(|seat| self.price(seat.tier())).sum()
    }
}
