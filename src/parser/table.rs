use super::ParseError;

/// How a rendered cell is coerced into its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    /// Integer, possibly with `,` thousands separators.
    Int,
    Decimal,
    /// Decimal wrapped in a currency symbol and an optional unit, e.g. `£5.5m`.
    Money,
}

pub trait FromCell: Sized {
    fn from_cell(raw: &str, kind: CellKind, field: &str) -> Result<Self, ParseError>;
}

impl FromCell for String {
    fn from_cell(raw: &str, _kind: CellKind, _field: &str) -> Result<Self, ParseError> {
        Ok(raw.trim().to_string())
    }
}

impl FromCell for i32 {
    fn from_cell(raw: &str, _kind: CellKind, field: &str) -> Result<Self, ParseError> {
        parse_int(field, raw)
    }
}

impl FromCell for f64 {
    fn from_cell(raw: &str, kind: CellKind, field: &str) -> Result<Self, ParseError> {
        match kind {
            CellKind::Money => parse_money(field, raw),
            _ => parse_decimal(field, raw),
        }
    }
}

/// Positional reader over one table row, validated against a column schema.
pub struct RowReader<'a> {
    table: &'static str,
    columns: &'static [(&'static str, CellKind)],
    cells: &'a [String],
    index: usize,
}

impl<'a> RowReader<'a> {
    pub fn new(
        table: &'static str,
        columns: &'static [(&'static str, CellKind)],
        cells: &'a [String],
    ) -> Result<Self, ParseError> {
        if cells.len() != columns.len() {
            return Err(ParseError::ColumnCount {
                table,
                expected: columns.len(),
                actual: cells.len(),
            });
        }

        Ok(Self {
            table,
            columns,
            cells,
            index: 0,
        })
    }

    pub fn next<T: FromCell>(&mut self) -> Result<T, ParseError> {
        let (Some((name, kind)), Some(raw)) =
            (self.columns.get(self.index), self.cells.get(self.index))
        else {
            return Err(ParseError::ColumnCount {
                table: self.table,
                expected: self.columns.len(),
                actual: self.index + 1,
            });
        };
        self.index += 1;

        T::from_cell(raw, *kind, &format!("{}.{}", self.table, name))
    }
}

fn invalid(field: &str, raw: &str) -> ParseError {
    ParseError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
    }
}

pub fn parse_int(field: &str, raw: &str) -> Result<i32, ParseError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<i32>().map_err(|_| invalid(field, raw))
}

pub fn parse_decimal(field: &str, raw: &str) -> Result<f64, ParseError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid(field, raw)),
    }
}

pub fn parse_money(field: &str, raw: &str) -> Result<f64, ParseError> {
    let mut amount = raw.trim();

    if let Some(first) = amount.chars().next() {
        if !first.is_ascii_digit() && first != '-' && first != '.' {
            amount = &amount[first.len_utf8()..];
        }
    }
    if let Some(last) = amount.chars().last() {
        if last.is_alphabetic() {
            amount = &amount[..amount.len() - last.len_utf8()];
        }
    }

    parse_decimal(field, amount).map_err(|_| invalid(field, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameweekStatRecord, HistoryRecord, PerNinetyStats, SeasonTotals};

    fn cells(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_money_cells() {
        assert_eq!(parse_money("price", "£5.5m").unwrap(), 5.5);
        assert_eq!(parse_money("price", "£12.0m").unwrap(), 12.0);
        assert_eq!(parse_money("price", "£4.5").unwrap(), 4.5);
        assert!(parse_money("price", "£m").is_err());
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(parse_int("sb", "1,234").unwrap(), 1234);
        assert_eq!(parse_int("sb", "2,345,678").unwrap(), 2_345_678);
        assert_eq!(parse_int("nt", "-12,004").unwrap(), -12_004);
        assert!(parse_int("points", "").is_err());
        assert!(parse_int("points", "4.5").is_err());
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        assert_eq!(parse_decimal("form", " 6.2 ").unwrap(), 6.2);
        assert!(parse_decimal("form", "-").is_err());
        assert!(parse_decimal("form", "inf").is_err());
    }

    fn gameweek_row() -> Vec<String> {
        cells(&[
            "7", "ARS (H) 2 - 1", "W", "12", "1", "90", "1", "1", "0.84", "0.31", "1.15", "1",
            "1", "0.92", "0", "0", "0", "1", "0", "0", "3", "41", "62.4", "35.1", "48.0", "14.6",
            "-12,345", "2,345,678", "£10.5",
        ])
    }

    #[test]
    fn test_gameweek_row_maps_columns_in_order() {
        let record = GameweekStatRecord::from_cells(&gameweek_row()).unwrap();

        assert_eq!(record.gameweek, 7);
        assert_eq!(record.opponent, "ARS (H) 2 - 1");
        assert_eq!(record.outcome, "W");
        assert_eq!(record.points, 12);
        assert_eq!(record.minutes_played, 90);
        assert_eq!(record.expected_goals, 0.84);
        assert_eq!(record.bonus_points, 3);
        assert_eq!(record.bonus_points_system, 41);
        assert_eq!(record.ict_index, 14.6);
        assert_eq!(record.net_transfers, -12_345);
        assert_eq!(record.selected_by, 2_345_678);
        assert_eq!(record.price, 10.5);
    }

    #[test]
    fn test_wrong_column_count_is_rejected() {
        let mut short = gameweek_row();
        short.pop();
        assert_eq!(
            GameweekStatRecord::from_cells(&short),
            Err(ParseError::ColumnCount {
                table: "gameweek_stats",
                expected: 29,
                actual: 28,
            })
        );

        let mut long = gameweek_row();
        long.push("extra".to_string());
        assert!(matches!(
            GameweekStatRecord::from_cells(&long),
            Err(ParseError::ColumnCount { actual: 30, .. })
        ));
    }

    #[test]
    fn test_bad_cell_names_the_column() {
        let mut row = gameweek_row();
        row[3] = "twelve".to_string();

        match GameweekStatRecord::from_cells(&row) {
            Err(ParseError::InvalidNumber { field, value }) => {
                assert_eq!(field, "gameweek_stats.points");
                assert_eq!(value, "twelve");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_schema_widths() {
        assert_eq!(GameweekStatRecord::COLUMNS.len(), 29);
        assert_eq!(SeasonTotals::COLUMNS.len(), 23);
        assert_eq!(PerNinetyStats::COLUMNS.len(), 7);
        assert_eq!(HistoryRecord::COLUMNS.len(), 26);
    }

    #[test]
    fn test_history_row_with_prices() {
        let row = cells(&[
            "2022/23", "182", "36", "3,120", "14", "11", "12.40", "8.15", "20.55", "12", "30",
            "31.20", "0", "0", "1", "3", "0", "0", "27", "712", "1,024.6", "980.3", "1,120.0",
            "312.4", "£8.0m", "£8.4m",
        ]);

        // decimals never carry thousands separators
        assert!(matches!(
            HistoryRecord::from_cells(&row),
            Err(ParseError::InvalidNumber { .. })
        ));

        let mut clean = row.clone();
        clean[20] = "1024.6".to_string();
        clean[22] = "1120.0".to_string();
        let record = HistoryRecord::from_cells(&clean).unwrap();
        assert_eq!(record.season, "2022/23");
        assert_eq!(record.minutes_played, 3120);
        assert_eq!(record.season_start_price, 8.0);
        assert_eq!(record.season_end_price, 8.4);
    }
}
