//! Strategy dashboard: table rows and ratatui drawing.

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::Decimal;
use spread_watch_core::format::{self, PLACEHOLDER};
use spread_watch_core::{PositionDetail, PriceTrend, StrategyMetrics};

const TITLE: &str = "Portfolio Strategy Monitor";
const HELP: &str = "Press Ctrl+C to quit";

const SUMMARY_HEADER: [&str; 5] = [
    "Group Name",
    "Net Credit/Debit",
    "Net Open Price",
    "P&L Amount",
    "P&L %",
];
const DETAIL_HEADER: [&str; 4] = ["Group Name", "Symbol", "Quantity", "Market Price"];

/// Which tables to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub summary: bool,
    pub details: bool,
}

impl DisplayMode {
    /// No flag shows both tables; otherwise only the named ones.
    #[must_use]
    pub fn from_flags(strategies: bool, details: bool) -> Self {
        if strategies || details {
            Self {
                summary: strategies,
                details,
            }
        } else {
            Self {
                summary: true,
                details: true,
            }
        }
    }
}

/// Everything one frame shows.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub source: String,
    pub metrics: Vec<StrategyMetrics>,
    pub details: Vec<PositionDetail>,
    pub last_update: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub cells: [String; 5],
    pub pnl_color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub cells: [String; 4],
    pub price_color: Color,
}

#[must_use]
pub fn pnl_color(amount: Option<Decimal>) -> Color {
    match amount {
        Some(a) if a > Decimal::ZERO => Color::Green,
        Some(a) if a < Decimal::ZERO => Color::Red,
        _ => Color::White,
    }
}

#[must_use]
pub fn trend_color(trend: PriceTrend) -> Color {
    match trend {
        PriceTrend::Up => Color::Green,
        PriceTrend::Down => Color::Red,
        PriceTrend::Unchanged => Color::White,
    }
}

#[must_use]
pub fn summary_rows(metrics: &[StrategyMetrics]) -> Vec<SummaryRow> {
    metrics
        .iter()
        .map(|m| {
            let amount = m.pnl.map(|p| p.amount);
            SummaryRow {
                cells: [
                    m.group.clone(),
                    format::money(m.net_value),
                    format::money(m.net_open_price),
                    format::money(amount),
                    format::percent(m.pnl.map(|p| p.percent)),
                ],
                pnl_color: pnl_color(amount),
            }
        })
        .collect()
}

#[must_use]
pub fn detail_rows(details: &[PositionDetail]) -> Vec<DetailRow> {
    details
        .iter()
        .map(|d| DetailRow {
            cells: [
                d.group.clone(),
                d.streamer_symbol.clone(),
                format::quantity(d.quantity),
                format::money(d.price),
            ],
            price_color: trend_color(d.trend),
        })
        .collect()
}

/// `Current time: HH:MM | Last update: Ns ago`
#[must_use]
pub fn status_line(now: DateTime<Local>, last_update: Option<DateTime<Local>>) -> String {
    let since = last_update.map_or_else(
        || PLACEHOLDER.to_string(),
        |at| format!("{}s ago", (now - at).num_seconds().max(0)),
    );
    format!("Current time: {} | Last update: {}", now.format("%H:%M"), since)
}

fn header_row<'a>(titles: &[&'a str]) -> Row<'a> {
    Row::new(titles.to_vec())
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .bottom_margin(1)
}

fn table_height(rows: usize) -> u16 {
    // borders + header + header margin
    u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(4)
}

pub fn draw(f: &mut Frame, state: &DashboardState, mode: DisplayMode, now: DateTime<Local>) {
    let summary = summary_rows(&state.metrics);
    let details = detail_rows(&state.details);

    let summary_height = if mode.summary {
        table_height(summary.len())
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // Title
            Constraint::Length(1),              // Data source
            Constraint::Length(summary_height), // Strategies
            Constraint::Min(0),                 // Positions
            Constraint::Length(1),              // Status
            Constraint::Length(1),              // Help
        ])
        .split(f.area());

    let title = Paragraph::new(TITLE)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let source = Paragraph::new(format!("Data Source: {}", state.source))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(source, chunks[1]);

    if mode.summary {
        let rows = summary.into_iter().map(|row| {
            let color = row.pnl_color;
            let [group, net, open, amount, pct] = row.cells;
            Row::new(vec![
                Cell::from(group),
                Cell::from(net),
                Cell::from(open),
                Cell::from(amount).style(Style::default().fg(color)),
                Cell::from(pct).style(Style::default().fg(color)),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(20), // Group Name
                Constraint::Length(18), // Net Credit/Debit
                Constraint::Length(16), // Net Open Price
                Constraint::Length(12), // P&L Amount
                Constraint::Length(10), // P&L %
            ],
        )
        .header(header_row(&SUMMARY_HEADER))
        .block(Block::default().borders(Borders::ALL).title("Strategies"));
        f.render_widget(table, chunks[2]);
    }

    if mode.details {
        let rows = details.into_iter().map(|row| {
            let color = row.price_color;
            let [group, symbol, qty, price] = row.cells;
            Row::new(vec![
                Cell::from(group),
                Cell::from(symbol),
                Cell::from(qty),
                Cell::from(price).style(Style::default().fg(color)),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(20), // Group Name
                Constraint::Length(24), // Symbol
                Constraint::Length(10), // Quantity
                Constraint::Length(14), // Market Price
            ],
        )
        .header(header_row(&DETAIL_HEADER))
        .block(Block::default().borders(Borders::ALL).title("Positions"));
        f.render_widget(table, chunks[3]);
    }

    f.render_widget(Paragraph::new(status_line(now, state.last_update)), chunks[4]);
    f.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        chunks[5],
    );
}
