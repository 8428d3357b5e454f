use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ряды начиная с этой буквы - VIP.
pub const FIRST_VIP_ROW: char = 'F';

/// Класс места: определяется только буквой ряда, отдельно не хранится.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Vip,
}

impl Tier {
    pub fn for_row(row: char) -> Self {
        if row >= FIRST_VIP_ROW {
            Tier::Vip
        } else {
            Tier::Standard
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Standard => f.write_str("standard"),
            Tier::Vip => f.write_str("vip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid seat code {0:?}")]
pub struct InvalidSeatCode(pub String);

/// Код места: буква ряда + номер, например `A3` или `G18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatCode {
    row: char,
    number: u8,
}

impl SeatCode {
    pub fn new(row: char, number: u8) -> Result<Self, InvalidSeatCode> {
        if !row.is_ascii_uppercase() || number == 0 {
            return Err(InvalidSeatCode(format!("{}{}", row, number)));
        }
        Ok(Self { row, number })
    }

    pub fn row(&self) -> char {
        self.row
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn tier(&self) -> Tier {
        Tier::for_row(self.row)
    }
}

impl fmt::Display for SeatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

impl FromStr for SeatCode {
    type Err = InvalidSeatCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let row = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .ok_or_else(|| InvalidSeatCode(s.to_string()))?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidSeatCode(s.to_string()));
        }
        let number: u8 = digits.parse().map_err(|_| InvalidSeatCode(s.to_string()))?;
        SeatCode::new(row, number).map_err(|_| InvalidSeatCode(s.to_string()))
    }
}

impl TryFrom<String> for SeatCode {
    type Error = InvalidSeatCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatCode> for String {
    fn from(code: SeatCode) -> Self {
        code.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_seat_codes() {
        let seat: SeatCode = "g18".parse().unwrap();
        assert_eq!(seat.row(), 'G');
        assert_eq!(seat.number(), 18);
        assert_eq!(seat.to_string(), "G18");
    }

    #[test]
    fn rejects_malformed_codes() {
        for bad in ["", "A", "1A", "A0", "A-1", "AA1", "A300"] {
            assert!(bad.parse::<SeatCode>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn tier_follows_row_letter() {
        assert_eq!("E9".parse::<SeatCode>().unwrap().tier(), Tier::Standard);
        assert_eq!("F1".parse::<SeatCode>().unwrap().tier(), Tier::Vip);
    }

    #[test]
    fn serializes_as_plain_string() {
        let seat: SeatCode = "B12".parse().unwrap();
        assert_eq!(serde_json::to_string(&seat).unwrap(), "\"B12\"");
        let back: SeatCode = serde_json::from_str("\"B12\"").unwrap();
        assert_eq!(back, seat);
    }
}
