use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Vacations,
    Birthdays,
    Holidays,
    Achievements,
    Adventures,
    Family,
    Creativity,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Vacations,
        Category::Birthdays,
        Category::Holidays,
        Category::Achievements,
        Category::Adventures,
        Category::Family,
        Category::Creativity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vacations => "Vacations",
            Category::Birthdays => "Birthdays",
            Category::Holidays => "Holidays",
            Category::Achievements => "Achievements",
            Category::Adventures => "Adventures",
            Category::Family => "Family",
            Category::Creativity => "Creativity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::Validation(format!("Unknown category: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("family".parse::<Category>().unwrap(), Category::Family);
        assert_eq!(" BIRTHDAYS ".parse::<Category>().unwrap(), Category::Birthdays);
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&Category::Adventures).unwrap();
        assert_eq!(json, "\"Adventures\"");
    }

    #[test]
    fn test_default_is_vacations() {
        assert_eq!(Category::default(), Category::Vacations);
    }
}
