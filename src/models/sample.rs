use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Apparent color of the sample, as offered by the form selector
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum WaterColor {
    #[strum(to_string = "Colorless")]
    Colorless,
    #[serde(rename = "Near Colorless")]
    #[strum(to_string = "Near Colorless")]
    NearColorless,
    #[serde(rename = "Faint Yellow")]
    #[strum(to_string = "Faint Yellow")]
    FaintYellow,
    #[serde(rename = "Light Yellow")]
    #[strum(to_string = "Light Yellow")]
    LightYellow,
    #[strum(to_string = "Yellow")]
    Yellow,
}

/// Where the sample was drawn from
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum WaterSource {
    Well,
    Aquifer,
    Stream,
    Ground,
    River,
    Lake,
    Reservoir,
    Spring,
}

/// Month the sample was taken
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// Longest day number the month can have. No year is collected, so
    /// February admits the 29th.
    pub fn max_day(&self) -> u8 {
        match self {
            Month::February => 29,
            Month::April | Month::June | Month::September | Month::November => 30,
            _ => 31,
        }
    }
}
