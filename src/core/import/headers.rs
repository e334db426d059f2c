//! CSV header conventions shared by the payment and attendance imports.
//!
//! Historical files name month columns like `JAN_2025`, `jAN 2022` or `Avgust2023` and
//! attendance date columns like `4-Sep`. Month tokens are resolved through one static
//! table covering English and Serbian spellings, full and abbreviated, in any case.

use crate::errors::{Error, Result};
use chrono::NaiveDate;
use regex::Regex;

/// Month-name tokens accepted in headers, lowercase.
const MONTH_NAMES: &[(&str, u32)] = &[
    ("jan", 1),
    ("january", 1),
    ("januar", 1),
    ("feb", 2),
    ("february", 2),
    ("februar", 2),
    ("mar", 3),
    ("march", 3),
    ("mart", 3),
    ("apr", 4),
    ("april", 4),
    ("may", 5),
    ("maj", 5),
    ("jun", 6),
    ("june", 6),
    ("juni", 6),
    ("jul", 7),
    ("july", 7),
    ("juli", 7),
    ("aug", 8),
    ("august", 8),
    ("avg", 8),
    ("avgust", 8),
    ("sep", 9),
    ("sept", 9),
    ("september", 9),
    ("septembar", 9),
    ("oct", 10),
    ("october", 10),
    ("okt", 10),
    ("oktobar", 10),
    ("nov", 11),
    ("november", 11),
    ("novembar", 11),
    ("dec", 12),
    ("december", 12),
    ("dek", 12),
    ("decembar", 12),
];

const MONTH_HEADER_PATTERN: &str = r"^([A-Za-z]+)\s*[_ ]?\s*(\d{4})$";
const DAY_MONTH_HEADER_PATTERN: &str = r"^(\d{1,2})-([A-Za-z]+)$";

/// Resolves a month-name token, ignoring case.
#[must_use]
pub fn month_number(token: &str) -> Option<u32> {
    let token = token.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, number)| *number)
}

/// A payment column addressing one (year, month).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthColumn {
    /// Zero-based column index in the CSV
    pub index: usize,
    /// Year from the header
    pub year: i32,
    /// Month from the header, 1-12
    pub month: u32,
}

/// An attendance column addressing one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateColumn {
    /// Zero-based column index in the CSV
    pub index: usize,
    /// Date the column stands for
    pub date: NaiveDate,
}

/// Identity columns located by header name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityColumns {
    /// Membership number column
    pub membership_number: Option<usize>,
    /// Email column
    pub email: Option<usize>,
    /// Name column
    pub name: Option<usize>,
}

/// Compiled header patterns.
#[derive(Debug)]
pub struct HeaderParser {
    month_header: Regex,
    day_month_header: Regex,
}

impl HeaderParser {
    /// Compiles the header patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            month_header: Regex::new(MONTH_HEADER_PATTERN)?,
            day_month_header: Regex::new(DAY_MONTH_HEADER_PATTERN)?,
        })
    }

    /// Parses one payment header into (year, month).
    #[must_use]
    pub fn parse_month_header(&self, header: &str) -> Option<(i32, u32)> {
        let captures = self.month_header.captures(header.trim())?;
        let month = month_number(captures.get(1)?.as_str())?;
        let year = captures.get(2)?.as_str().parse().ok()?;
        Some((year, month))
    }

    /// Parses one attendance header such as `4-Sep` into a date in `year`.
    #[must_use]
    pub fn parse_day_month_header(&self, header: &str, year: i32) -> Option<NaiveDate> {
        let captures = self.day_month_header.captures(header.trim())?;
        let day = captures.get(1)?.as_str().parse().ok()?;
        let month = month_number(captures.get(2)?.as_str())?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// All payment month columns. Fails if there are none.
    pub fn month_columns(&self, headers: &csv::StringRecord) -> Result<Vec<MonthColumn>> {
        let columns: Vec<MonthColumn> = headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                self.parse_month_header(header)
                    .map(|(year, month)| MonthColumn { index, year, month })
            })
            .collect();

        if columns.is_empty() {
            return Err(Error::validation(
                "No month columns found; expected headers like JAN_2025",
            ));
        }
        Ok(columns)
    }

    /// All attendance date columns for `year`. Fails if there are none.
    pub fn date_columns(&self, headers: &csv::StringRecord, year: i32) -> Result<Vec<DateColumn>> {
        let columns: Vec<DateColumn> = headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                self.parse_day_month_header(header, year)
                    .map(|date| DateColumn { index, date })
            })
            .collect();

        if columns.is_empty() {
            return Err(Error::validation(
                "No date columns found; expected headers like 4-Sep",
            ));
        }
        Ok(columns)
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Locates the membership number, email and name columns by header name.
#[must_use]
pub fn identity_columns(headers: &csv::StringRecord) -> IdentityColumns {
    let mut columns = IdentityColumns::default();
    for (index, header) in headers.iter().enumerate() {
        match normalize_header(header).as_str() {
            "membershipnumber" | "membershipno" | "membernumber" | "memberno" | "number"
            | "clanskibroj" | "brojclana" | "broj" => {
                columns.membership_number.get_or_insert(index);
            }
            "email" | "emailaddress" | "mail" => {
                columns.email.get_or_insert(index);
            }
            "name" | "fullname" | "member" | "imeiprezime" | "ime" => {
                columns.name.get_or_insert(index);
            }
            _ => {}
        }
    }
    columns
}

/// Whether a cell merely repeats a header label, as happens when exported sheets
/// carry a second header row.
#[must_use]
pub fn is_header_label(cell: &str) -> bool {
    matches!(
        normalize_header(cell).as_str(),
        "membershipnumber"
            | "membershipno"
            | "membernumber"
            | "memberno"
            | "number"
            | "clanskibroj"
            | "brojclana"
            | "broj"
            | "email"
            | "name"
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn parser() -> HeaderParser {
        HeaderParser::new().unwrap()
    }

    #[test]
    fn test_month_header_variants() {
        let p = parser();
        assert_eq!(p.parse_month_header("JAN_2025"), Some((2025, 1)));
        assert_eq!(p.parse_month_header("jAN 2022"), Some((2022, 1)));
        assert_eq!(p.parse_month_header("Avgust2023"), Some((2023, 8)));
        assert_eq!(p.parse_month_header("okt _ 2024"), Some((2024, 10)));
        assert_eq!(p.parse_month_header("Decembar_2021"), Some((2021, 12)));
        assert_eq!(p.parse_month_header(" MAJ 2025 "), Some((2025, 5)));
    }

    #[test]
    fn test_month_header_rejects_non_matching() {
        let p = parser();
        assert_eq!(p.parse_month_header("Email"), None);
        assert_eq!(p.parse_month_header("Membership_Number"), None);
        assert_eq!(p.parse_month_header("JAN_25"), None);
        assert_eq!(p.parse_month_header("Foo_2025"), None);
        assert_eq!(p.parse_month_header("JAN-2025"), None);
    }

    #[test]
    fn test_day_month_header() {
        let p = parser();
        assert_eq!(
            p.parse_day_month_header("4-Sep", 2025),
            NaiveDate::from_ymd_opt(2025, 9, 4)
        );
        assert_eq!(
            p.parse_day_month_header("29-feb", 2024),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(p.parse_day_month_header("29-feb", 2025), None);
        assert_eq!(p.parse_day_month_header("Name", 2025), None);
    }

    #[test]
    fn test_month_columns_requires_at_least_one() {
        let p = parser();
        let headers = csv::StringRecord::from(vec!["Email", "Membership_Number"]);
        assert!(matches!(
            p.month_columns(&headers),
            Err(Error::Validation { .. })
        ));

        let headers = csv::StringRecord::from(vec![
            "Email",
            "Membership_Number",
            "JAN_2025",
            "Note",
            "FEB_2025",
        ]);
        let columns = p.month_columns(&headers).unwrap();
        assert_eq!(
            columns,
            vec![
                MonthColumn {
                    index: 2,
                    year: 2025,
                    month: 1,
                },
                MonthColumn {
                    index: 4,
                    year: 2025,
                    month: 2,
                },
            ]
        );
    }

    #[test]
    fn test_identity_columns() {
        let headers =
            csv::StringRecord::from(vec!["Name", "E-mail", "Membership Number", "JAN_2025"]);
        let columns = identity_columns(&headers);
        assert_eq!(columns.name, Some(0));
        assert_eq!(columns.email, Some(1));
        assert_eq!(columns.membership_number, Some(2));
    }

    #[test]
    fn test_header_label_detection() {
        assert!(is_header_label("Membership_Number"));
        assert!(is_header_label("EMAIL"));
        assert!(!is_header_label("12"));
    }
}
