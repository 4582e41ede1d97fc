use super::table::{parse_decimal, parse_int, parse_money};
use super::ParseError;
use crate::model::{PlayerStatus, PlayerSummary, Position, Severity};
use regex::Regex;
use std::sync::OnceLock;

/// Line offsets inside the summary block of an active player.
mod line {
    pub const POSITION: usize = 0;
    pub const NAME: usize = 1;
    pub const TEAM: usize = 2;
    pub const PRICE: usize = 4;
    pub const FORM: usize = 7;
    pub const POINTS_PER_MATCH: usize = 9;
    pub const GAMEWEEK_POINTS: usize = 12;
    pub const TOTAL_POINTS: usize = 14;
    pub const TOTAL_BONUS: usize = 16;
    pub const ICT_INDEX: usize = 18;
    pub const SELECTED_BY: usize = 21;
}

fn chance_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{1,3})% chance").expect("valid regex"))
}

fn page_count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s+of\s+(\d+)\s*$").expect("valid regex"))
}

/// Doubtful players carry a non-zero chance of playing; everything else
/// (injured, suspended, left the club) is a red flag.
pub fn flag_severity(reason: &str) -> Severity {
    match chance_pattern()
        .captures(reason)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    {
        Some(chance) if chance > 0 => Severity::Yellow,
        _ => Severity::Red,
    }
}

/// Parses the detail dialog's summary block, already split into lines.
///
/// Flagged players render their flag reason above the position label, which
/// shifts every following line down by one.
pub fn parse_player_summary(lines: &[String]) -> Result<PlayerSummary, ParseError> {
    let first = lines.first().map(|l| l.trim()).unwrap_or_default();

    let (status, offset) = match first.parse::<Position>() {
        Ok(_) => (PlayerStatus::Active, 0),
        Err(()) => (
            PlayerStatus::Flagged {
                severity: flag_severity(first),
                reason: first.to_string(),
            },
            1,
        ),
    };

    let required = offset + line::SELECTED_BY + 1;
    if lines.len() < required {
        return Err(ParseError::TooFewLines {
            expected: required,
            actual: lines.len(),
        });
    }

    let at = |index: usize| lines[offset + index].trim();

    let position = at(line::POSITION)
        .parse::<Position>()
        .map_err(|()| ParseError::InvalidNumber {
            field: "summary.position".to_string(),
            value: at(line::POSITION).to_string(),
        })?;

    let selected_by = at(line::SELECTED_BY);
    let selected_by = selected_by.strip_suffix('%').unwrap_or(selected_by);

    Ok(PlayerSummary {
        status,
        position,
        name: at(line::NAME).to_string(),
        team: at(line::TEAM).to_string(),
        price: parse_money("summary.price", at(line::PRICE))?,
        form: parse_decimal("summary.form", at(line::FORM))?,
        points_per_match: parse_decimal("summary.points_per_match", at(line::POINTS_PER_MATCH))?,
        gameweek_points: parse_int("summary.gameweek_points", at(line::GAMEWEEK_POINTS))?,
        total_points: parse_int("summary.total_points", at(line::TOTAL_POINTS))?,
        total_bonus: parse_int("summary.total_bonus", at(line::TOTAL_BONUS))?,
        ict_index: parse_decimal("summary.ict_index", at(line::ICT_INDEX))?,
        selected_by_percent: parse_decimal("summary.selected_by", selected_by)?,
    })
}

/// Reads the total page count from the pagination label (`"1 of 22"`).
pub fn parse_page_count(texts: &[String]) -> Result<usize, ParseError> {
    texts
        .iter()
        .find_map(|text| page_count_pattern().captures(text.trim()))
        .and_then(|caps| caps[2].parse::<usize>().ok())
        .filter(|count| *count > 0)
        .ok_or_else(|| ParseError::PageCount(texts.join(" | ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock_browser::sample_summary;

    fn summary_lines(flag: Option<&str>, name: &str) -> Vec<String> {
        let mut lines: Vec<String> = flag.into_iter().map(str::to_string).collect();
        lines.extend(sample_summary(name));
        lines
    }

    #[test]
    fn test_active_player() {
        let summary = parse_player_summary(&summary_lines(None, "Mohamed Salah")).unwrap();

        assert_eq!(summary.status, PlayerStatus::Active);
        assert_eq!(summary.position, Position::Midfielder);
        assert_eq!(summary.name, "Mohamed Salah");
        assert_eq!(summary.team, "Liverpool");
        assert_eq!(summary.price, 12.8);
        assert_eq!(summary.form, 8.4);
        assert_eq!(summary.points_per_match, 7.2);
        assert_eq!(summary.gameweek_points, 15);
        assert_eq!(summary.total_points, 98);
        assert_eq!(summary.total_bonus, 12);
        assert_eq!(summary.ict_index, 150.3);
        assert_eq!(summary.selected_by_percent, 45.6);
    }

    #[test]
    fn test_flagged_player_shifts_offsets() {
        let reason = "Hamstring injury - 75% chance of playing";
        let summary = parse_player_summary(&summary_lines(Some(reason), "Bukayo Saka")).unwrap();

        assert_eq!(
            summary.status,
            PlayerStatus::Flagged {
                severity: Severity::Yellow,
                reason: reason.to_string(),
            }
        );
        assert_eq!(summary.name, "Bukayo Saka");
        assert_eq!(summary.total_points, 98);
        assert_eq!(summary.selected_by_percent, 45.6);
    }

    #[test]
    fn test_flag_severity() {
        assert_eq!(flag_severity("Knee injury - 25% chance of playing"), Severity::Yellow);
        assert_eq!(flag_severity("Suspended until 02 Nov"), Severity::Red);
        assert_eq!(flag_severity("Ankle injury - 0% chance of playing"), Severity::Red);
    }

    #[test]
    fn test_too_few_lines() {
        let mut lines = summary_lines(None, "Short");
        lines.truncate(10);
        assert_eq!(
            parse_player_summary(&lines),
            Err(ParseError::TooFewLines {
                expected: 22,
                actual: 10,
            })
        );
    }

    #[test]
    fn test_page_count() {
        let texts = vec!["Previous".to_string(), "Page 1 of 22".to_string()];
        assert_eq!(parse_page_count(&texts).unwrap(), 22);

        let texts = vec!["1 of 3 ".to_string()];
        assert_eq!(parse_page_count(&texts).unwrap(), 3);

        assert!(parse_page_count(&["no pages".to_string()]).is_err());
        assert!(parse_page_count(&[]).is_err());
    }
}
