//! Rendering of published states for the terminal.

use anyhow::Result;
use market_core::Signal;
use refresh_scheduler::{CyclePhase, MarketState};

use crate::config::OutputFormat;

/// Candidates listed in the log summary
const SUMMARY_TOP_N: usize = 5;

pub fn report(state: &MarketState, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json_line(state)?),
        OutputFormat::Log => log_summary(state),
    }
    Ok(())
}

pub fn to_json_line(state: &MarketState) -> Result<String> {
    Ok(serde_json::to_string(state)?)
}

fn log_summary(state: &MarketState) {
    match state.phase {
        CyclePhase::Idle | CyclePhase::Fetching => {}
        CyclePhase::Failed => {
            tracing::warn!(
                "{} (last good data: {})",
                state.snapshot.error.as_deref().unwrap_or("refresh failed"),
                state
                    .last_updated_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "none".to_string())
            );
        }
        CyclePhase::Published => {
            for line in summary_lines(state) {
                tracing::info!("{}", line);
            }
        }
    }
}

/// Human-readable lines for one published state
pub fn summary_lines(state: &MarketState) -> Vec<String> {
    let snapshot = &state.snapshot;
    let mut lines = Vec::new();

    for index in &snapshot.indices {
        lines.push(format!(
            "{:<20} {:>10.2} {:>+8.2} ({:+.2}%)",
            index.name, index.last_price, index.absolute_change, index.percent_change
        ));
    }

    if let Some(sentiment) = &snapshot.sentiment {
        lines.push(format!(
            "Breadth: {} up / {} down / {} flat, {:.1}% advancing, limit up {} / down {}",
            sentiment.advancing_count,
            sentiment.declining_count,
            sentiment.unchanged_count,
            sentiment.advance_ratio_percent,
            sentiment.limit_up_count,
            sentiment.limit_down_count
        ));
    }

    lines.push(format!(
        "Mode: {} {} | attack {} defense {} sideways {} | weights {}",
        snapshot.mode.label,
        snapshot.mode.score,
        snapshot.regime.attack,
        snapshot.regime.defense,
        snapshot.regime.neutral,
        snapshot.weights.describe()
    ));

    for r in snapshot.ranked.iter().take(SUMMARY_TOP_N) {
        let marker = if r.signal == Signal::Buy { "*" } else { " " };
        lines.push(format!(
            "#{:<2}{} {} {} {:.2} ({:+.2}%) score {} {}",
            r.rank,
            marker,
            r.symbol_code,
            r.display_name,
            r.price,
            r.change_percent,
            r.score,
            r.signal.as_str()
        ));
    }

    lines
}
