//! Ленивое создание расписания.
//!
//! Если на выбранный день у фильма нет ни одного сеанса, генерируем
//! правдоподобное расписание по всем кинотеатрам. Повторный вызов для дня,
//! где сеансы уже есть, ничего не создаёт. Блокировок нет: два
//! одновременных вызова для пустого дня могут сгенерировать расписание дважды.

use chrono::{NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{NewShowtime, Showtime};
use crate::services::pricing::round_up_to_ten;
use crate::store::{Store, StoreResult};

/// Ежедневные слоты (часы, минуты).
pub const DAILY_SLOTS: [(u32, u32); 5] = [(9, 30), (12, 30), (15, 30), (18, 30), (21, 30)];
pub const SLOT_PROBABILITY: f64 = 0.7;
pub const SCREEN_COUNT: u32 = 5;
pub const STANDARD_PRICE_RANGE: (i32, i32) = (180, 350);
pub const VIP_PRICE_RANGE: (i32, i32) = (400, 600);

pub fn random_screen<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("Screen {}", rng.gen_range(1..=SCREEN_COUNT))
}

/// Расписание на день: по каждому кинотеатру каждый слот берётся с вероятностью 0.7.
pub fn generate_schedule<R: Rng + ?Sized>(
    rng: &mut R,
    movie_id: Uuid,
    theater_ids: &[Uuid],
    date: NaiveDate,
) -> Vec<NewShowtime> {
    let mut schedule = Vec::new();
    for theater_id in theater_ids {
        for (hour, minute) in DAILY_SLOTS {
            if !rng.gen_bool(SLOT_PROBABILITY) {
                continue;
            }
            let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                continue;
            };
            let standard = rng.gen_range(STANDARD_PRICE_RANGE.0..=STANDARD_PRICE_RANGE.1);
            let vip = rng.gen_range(VIP_PRICE_RANGE.0..=VIP_PRICE_RANGE.1);
            schedule.push(NewShowtime {
                movie_id,
                theater_id: *theater_id,
                starts_at: date.and_time(time),
                screen: random_screen(rng),
                price_standard: round_up_to_ten(standard),
                price_vip: round_up_to_ten(vip),
            });
        }
    }
    schedule
}

pub struct ShowtimeProvisioner {
    store: Arc<dyn Store>,
    rng: Mutex<StdRng>,
}

impl ShowtimeProvisioner {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// Детерминированный генератор - для тестов и воспроизводимых демо.
    pub fn with_seed(store: Arc<dyn Store>, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(store: Arc<dyn Store>, rng: StdRng) -> Self {
        Self {
            store,
            rng: Mutex::new(rng),
        }
    }

    /// Экран для сеанса, который создаёт администратор.
    pub fn pick_screen(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        random_screen(&mut *rng)
    }

    /// Гарантирует, что у фильма есть сеансы на `date`.
    ///
    /// Ошибка сохранения сгенерированных сеансов логируется и глотается:
    /// в этом случае вернётся то, что есть в хранилище (возможно, пустой
    /// список). Пустой результат означает "сеансов нет", а не сбой.
    pub async fn ensure_showtimes(
        &self,
        movie_id: Uuid,
        theater_ids: &[Uuid],
        date: NaiveDate,
    ) -> StoreResult<Vec<Showtime>> {
        let existing = self.store.showtimes_on(movie_id, date).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let schedule = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            generate_schedule(&mut *rng, movie_id, theater_ids, date)
        };

        if !schedule.is_empty() {
            let count = schedule.len();
            match self.store.insert_showtimes(schedule).await {
                Ok(_) => info!("Generated {} showtimes for movie {} on {}", count, movie_id, date),
                Err(e) => error!("Failed to save generated showtimes for movie {}: {}", movie_id, e),
            }
        }

        self.store.showtimes_on(movie_id, date).await
    }
}
