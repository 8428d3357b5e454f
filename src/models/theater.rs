use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Theater {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub facilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTheater {
    pub name: String,
    pub location: String,
    pub facilities: Vec<String>,
}

// Справочник кинотеатров, которым заполняется пустая таблица
pub fn default_theaters() -> Vec<NewTheater> {
    let seed: [(&str, &str, &[&str]); 7] = [
        ("PVR: Vegas Mall, Dwarka", "Dwarka, New Delhi", &["Dolby Atmos", "Recliner", "4DX"]),
        ("INOX: Nehru Place", "Nehru Place, New Delhi", &["IMAX", "Laser", "F&B"]),
        ("Cinepolis: DLF Avenue", "Saket, New Delhi", &["Coffee Shop", "Lounge"]),
        ("PVR: Pacific Mall", "Subhash Nagar, New Delhi", &["Gold Class", "Playhouse"]),
        ("PVR: Director's Cut", "Vasant Kunj, New Delhi", &["Luxury", "Gourmet Food", "Recliner"]),
        ("Liberty Cinema", "Karol Bagh, New Delhi", &["Heritage", "Single Screen", "Dolby 7.1"]),
        ("Satyem Cineplex", "Janakpuri, New Delhi", &["Family Friendly", "Budget"]),
    ];

    seed.iter()
        .map(|(name, location, facilities)| NewTheater {
            name: name.to_string(),
            location: location.to_string(),
            facilities: facilities.iter().map(|f| f.to_string()).collect(),
        })
        .collect()
}
