use super::{Browser, BrowserError, BrowserResult};
use crate::config::Selectors;
use crate::model::{GameweekStatRecord, HistoryRecord, PerNinetyStats, SeasonTotals};
use crate::parser::CellKind;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Scripted content of one listing row's detail dialog.
#[derive(Debug, Clone, Default)]
pub struct MockPlayer {
    pub summary: Vec<String>,
    pub gameweek_rows: Vec<Vec<String>>,
    pub season_totals: Option<Vec<String>>,
    pub per_ninety: Option<Vec<String>>,
    pub history_rows: Vec<Vec<String>>,
    pub fixtures: String,
    /// Container lookups that report nothing before the tables render.
    pub lazy_table_reads: usize,
    /// Fixture reads that come back empty before the tab renders.
    pub lazy_fixture_reads: usize,
}

impl MockPlayer {
    /// A fully rendered, unflagged player whose tables all match their
    /// schemas.
    pub fn sample(name: &str) -> Self {
        Self {
            summary: sample_summary(name),
            gameweek_rows: vec![sample_row(GameweekStatRecord::COLUMNS); 2],
            season_totals: Some(sample_row(SeasonTotals::COLUMNS)),
            per_ninety: Some(sample_row(PerNinetyStats::COLUMNS)),
            history_rows: vec![sample_row(HistoryRecord::COLUMNS)],
            fixtures: "Sat 19 Oct 15:009ARS (H)3TBCLIV (A)4".to_string(),
            ..Default::default()
        }
    }

    /// Puts a flag reason above the position line.
    pub fn flagged(mut self, reason: &str) -> Self {
        self.summary.insert(0, reason.to_string());
        self
    }

    pub fn lazy(mut self, table_reads: usize, fixture_reads: usize) -> Self {
        self.lazy_table_reads = table_reads;
        self.lazy_fixture_reads = fixture_reads;
        self
    }
}

/// Summary block lines of an active midfielder.
pub fn sample_summary(name: &str) -> Vec<String> {
    [
        "Midfielder",
        name,
        "Liverpool",
        "Price",
        "£12.8m",
        "Form",
        "Pts / Match",
        "8.4",
        "GW7",
        "7.2",
        "Total Pts",
        "ICT Index",
        "15",
        "Bonus",
        "98",
        "TSB %",
        "12",
        "Form rank",
        "150.3",
        "1 of 212",
        "Selected by",
        "45.6%",
        "Upcoming",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}

/// One row of cells that satisfies `columns`.
pub fn sample_row(columns: &[(&str, CellKind)]) -> Vec<String> {
    columns
        .iter()
        .map(|(_, kind)| match kind {
            CellKind::Text => "ARS (H)",
            CellKind::Int => "1,204",
            CellKind::Decimal => "0.45",
            CellKind::Money => "£7.5",
        })
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct MockSite {
    pub pages: Vec<Vec<MockPlayer>>,
}

#[derive(Debug, Default)]
struct MockState {
    navigated: bool,
    consent_accepted: bool,
    page: usize,
    open_row: Option<usize>,
    fixtures_tab: bool,
    table_reads: usize,
    fixture_reads: usize,
    actions: Vec<String>,
}

/// In-memory stand-in for the statistics page, driven through the same
/// selectors as the real site.
pub struct MockBrowser {
    site: MockSite,
    selectors: Selectors,
    state: Mutex<MockState>,
}

impl MockBrowser {
    pub fn new(site: MockSite, selectors: Selectors) -> Self {
        Self {
            site,
            selectors,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Every interaction so far, in order.
    pub fn actions(&self) -> Vec<String> {
        self.state.lock().actions.clone()
    }

    pub fn current_page(&self) -> usize {
        self.state.lock().page
    }

    fn open_player(&self, state: &MockState) -> Option<&MockPlayer> {
        let row = state.open_row?;
        self.site.pages.get(state.page)?.get(row)
    }

    fn rows_on_page(&self, page: usize) -> usize {
        self.site.pages.get(page).map(Vec::len).unwrap_or(0)
    }

    fn is_last_page(&self, page: usize) -> bool {
        page + 1 >= self.site.pages.len()
    }

    fn intercepted(selector: &str) -> BrowserError {
        BrowserError::WebDriver {
            error: "element click intercepted".to_string(),
            message: format!("click on `{}` was intercepted", selector),
        }
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        let mut state = self.state.lock();
        state.actions.push(format!("navigate {}", url));
        state.navigated = true;
        state.page = 0;
        state.open_row = None;
        Ok(())
    }

    async fn click(&self, selector: &str) -> BrowserResult<()> {
        let mut state = self.state.lock();
        if !state.navigated {
            return Err(BrowserError::NoSuchElement(selector.to_string()));
        }

        if selector == self.selectors.consent_button {
            state.actions.push("accept consent".to_string());
            state.consent_accepted = true;
            return Ok(());
        }

        if selector == self.selectors.next_page_button {
            if state.open_row.is_some() || self.is_last_page(state.page) {
                return Err(Self::intercepted(selector));
            }
            state.page += 1;
            let page = state.page;
            state.actions.push(format!("next page {}", page));
            return Ok(());
        }

        if selector == self.selectors.dialog_close {
            if state.open_row.take().is_none() {
                return Err(BrowserError::NoSuchElement(selector.to_string()));
            }
            state.actions.push("close dialog".to_string());
            return Ok(());
        }

        if selector == self.selectors.fixtures_tab {
            if state.open_row.is_none() {
                return Err(BrowserError::NoSuchElement(selector.to_string()));
            }
            state.actions.push("open fixtures".to_string());
            state.fixtures_tab = true;
            return Ok(());
        }

        let rows = self.rows_on_page(state.page);
        if let Some(row) = (0..rows).find(|row| self.selectors.row_button(*row) == selector) {
            if !state.consent_accepted || state.open_row.is_some() {
                return Err(Self::intercepted(selector));
            }
            state.actions.push(format!("open row {}", row));
            state.open_row = Some(row);
            state.fixtures_tab = false;
            state.table_reads = 0;
            state.fixture_reads = 0;
            return Ok(());
        }

        Err(BrowserError::NoSuchElement(selector.to_string()))
    }

    async fn read_text(&self, selector: &str) -> BrowserResult<Vec<String>> {
        let mut state = self.state.lock();

        if selector == self.selectors.pagination_label {
            return Ok(vec![
                "Previous".to_string(),
                format!("Page {} of {}", state.page + 1, self.site.pages.len()),
            ]);
        }

        if selector == self.selectors.fixtures_body {
            if !state.fixtures_tab {
                return Err(BrowserError::NoSuchElement(selector.to_string()));
            }
            let lazy = self
                .open_player(&state)
                .map(|player| player.lazy_fixture_reads)
                .unwrap_or(0);
            if state.fixture_reads < lazy {
                state.fixture_reads += 1;
                return Ok(Vec::new());
            }
            state.actions.push("read fixtures".to_string());
            return Ok(self
                .open_player(&state)
                .map(|player| vec![player.fixtures.clone()])
                .unwrap_or_default());
        }

        Err(BrowserError::NoSuchElement(selector.to_string()))
    }

    async fn read_inner_text(&self, selector: &str) -> BrowserResult<Vec<String>> {
        let mut state = self.state.lock();

        if selector == self.selectors.dialog_summary {
            let summary = self
                .open_player(&state)
                .map(|player| player.summary.join("\n"))
                .ok_or_else(|| BrowserError::NoSuchElement(selector.to_string()))?;
            state.actions.push("read summary".to_string());
            return Ok(vec![summary]);
        }

        Err(BrowserError::NoSuchElement(selector.to_string()))
    }

    async fn read_attribute(&self, selector: &str, name: &str) -> BrowserResult<Option<String>> {
        let state = self.state.lock();

        if selector == self.selectors.next_page_button && name == "disabled" {
            return Ok(self.is_last_page(state.page).then(|| "true".to_string()));
        }

        Ok(None)
    }

    async fn count_matches(&self, selector: &str) -> BrowserResult<usize> {
        let mut state = self.state.lock();

        if selector == self.selectors.row_buttons {
            return Ok(self.rows_on_page(state.page));
        }

        if selector == self.selectors.season_table || selector == self.selectors.history_section {
            let Some(lazy) = self.open_player(&state).map(|player| player.lazy_table_reads)
            else {
                return Ok(0);
            };
            if state.table_reads < lazy {
                state.table_reads += 1;
                return Ok(0);
            }
            return Ok(1);
        }

        if selector == self.selectors.fixtures_body {
            return Ok(usize::from(state.fixtures_tab));
        }

        Ok(0)
    }

    async fn evaluate(&self, script: &str) -> BrowserResult<Vec<Vec<String>>> {
        let mut state = self.state.lock();
        let Some(player) = self.open_player(&state).cloned() else {
            return Err(BrowserError::Protocol("no dialog open".to_string()));
        };

        let table = |selector: &str| Selectors::rows_script(selector) == script;

        let (name, rows) = if table(&self.selectors.gameweek_rows) {
            ("gameweek", player.gameweek_rows)
        } else if table(&self.selectors.season_totals_row) {
            ("totals", player.season_totals.into_iter().collect())
        } else if table(&self.selectors.per_ninety_row) {
            ("per ninety", player.per_ninety.into_iter().collect())
        } else if table(&self.selectors.history_rows) {
            ("history", player.history_rows)
        } else {
            return Err(BrowserError::Protocol(format!("unknown script: {}", script)));
        };

        state.actions.push(format!("read {}", name));
        Ok(rows)
    }
}
