use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::Parser;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

use kanpo_calendar::environment::{parse_utc_offset, CalendarConfig};
use kanpo_calendar::feed::{load_feed_file, FeedDocument};
use kanpo_calendar::logging;
use kanpo_calendar::{BucketOrder, CalendarController, GridCell, IndexOptions, YearMonth};

const WEEKDAY_HEADER: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];
const NO_ARTICLES: &str = "この日の記事はありません。";

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse a pre-fetched gazette feed by calendar date", long_about = None)]
struct Args {
    /// Feed document to load (overrides KANPO_FEED_PATH)
    #[arg(short, long)]
    feed: Option<PathBuf>,

    /// Fixed UTC offset to read dates in, e.g. +09:00 (overrides KANPO_UTC_OFFSET)
    #[arg(long)]
    utc_offset: Option<String>,

    /// Ordering inside a day: "feed" or "newest" (overrides KANPO_BUCKET_ORDER)
    #[arg(long)]
    order: Option<BucketOrder>,

    /// Step back this many months from the initial month
    #[arg(long, default_value_t = 0)]
    prev: u32,

    /// Step forward this many months from the initial month
    #[arg(long, default_value_t = 0)]
    next: u32,

    /// Show this month (YYYY-MM) instead of stepping
    #[arg(long, conflicts_with_all = ["prev", "next"])]
    month: Option<YearMonth>,

    /// Select a day (YYYY-MM-DD) within the displayed month
    #[arg(short, long)]
    select: Option<String>,

    /// Number of recent items to list (overrides KANPO_RECENT_LIMIT)
    #[arg(long)]
    recent: Option<usize>,

    /// Print the read models as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging on the console
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::configure_logging(args.verbose);

    let mut config = CalendarConfig::from_env();
    if let Some(feed) = &args.feed {
        config.feed_path = feed.clone();
    }
    if let Some(offset) = &args.utc_offset {
        config.utc_offset = Some(
            parse_utc_offset(offset)
                .with_context(|| format!("Invalid --utc-offset {:?}", offset))?,
        );
    }
    if let Some(order) = args.order {
        config.bucket_order = order;
    }
    if let Some(recent) = args.recent {
        config.recent_limit = recent;
    }

    let document = load_feed_file(&config.feed_path)
        .with_context(|| format!("Failed to load feed from {}", config.feed_path.display()))?;

    match config.utc_offset {
        Some(offset) => run(document, offset, &args, &config),
        None => run(document, Local, &args, &config),
    }
}

fn run<Tz: TimeZone>(
    document: FeedDocument,
    tz: Tz,
    args: &Args,
    config: &CalendarConfig,
) -> Result<()> {
    let options = IndexOptions {
        order: config.bucket_order,
    };
    let mut calendar = CalendarController::from_document(document, tz, options);

    match args.month {
        Some(target) => {
            let steps = months_between(calendar.displayed_month(), target);
            for _ in 0..steps.unsigned_abs() {
                if steps < 0 {
                    calendar.on_prev_month();
                } else {
                    calendar.on_next_month();
                }
            }
        }
        None => {
            for _ in 0..args.prev {
                calendar.on_prev_month();
            }
            for _ in 0..args.next {
                calendar.on_next_month();
            }
        }
    }

    if let Some(storage_key) = &args.select {
        calendar.on_select_date(storage_key);
    }

    if args.json {
        print_json(&calendar, config.recent_limit)
    } else {
        print_text(&calendar, config.recent_limit);
        Ok(())
    }
}

fn months_between(from: YearMonth, to: YearMonth) -> i64 {
    (i64::from(to.year()) - i64::from(from.year())) * 12 + i64::from(to.month())
        - i64::from(from.month())
}

fn print_json<Tz: TimeZone>(calendar: &CalendarController<Tz>, recent_limit: usize) -> Result<()> {
    let output = json!({
        "updated_at": calendar.updated_at(),
        "displayed_month": calendar.displayed_month(),
        "grid": calendar.current_grid(),
        "selection": calendar.items_for_selection(),
        "latest": calendar.latest_item(),
        "recent": calendar.recent_items(recent_limit),
        "diagnostics": calendar.diagnostics(),
    });
    let rendered =
        serde_json::to_string_pretty(&output).context("Failed to serialize calendar output")?;
    println!("{}", rendered);
    Ok(())
}

fn print_text<Tz: TimeZone>(calendar: &CalendarController<Tz>, recent_limit: usize) {
    println!("\n{}", "═".repeat(40).bright_blue());
    println!(
        "{}",
        calendar.displayed_month().to_display_string().bright_blue()
    );
    if let Some(updated_at) = calendar.updated_at() {
        println!("{}: {}", "Updated".bright_blue(), updated_at.dimmed());
    }
    println!("{}", "═".repeat(40).bright_blue());

    let header: Vec<String> = WEEKDAY_HEADER.iter().map(|d| format!("{:>3}", d)).collect();
    println!("{}", header.join(" ").bold());
    for week in calendar.current_grid().chunks(7) {
        let row: Vec<String> = week.iter().map(render_cell).collect();
        println!("{}", row.join(" "));
    }

    let selection = calendar.items_for_selection();
    println!("\n{}", selection.display_label.bright_green());
    println!("{}", "─".repeat(40).dimmed());
    if selection.is_empty() {
        println!("{}", NO_ARTICLES.dimmed());
    }
    for (i, item) in selection.items.iter().enumerate() {
        println!(
            "{}. {} ({})\n   {}",
            i + 1,
            item.title.bright_white(),
            item.display_date.dimmed(),
            item.link.bright_cyan()
        );
    }

    let recent = calendar.recent_items(recent_limit);
    if !recent.is_empty() {
        println!("\n{}", "Recent".bright_blue());
        println!("{}", "─".repeat(40).dimmed());
        for item in recent {
            println!("{} {}", item.title.bright_white(), item.published.dimmed());
        }
    }

    if let Some(latest) = calendar.latest_item() {
        println!("\n{}: {}", "Latest issue".bright_blue(), latest.link.bright_cyan());
    }

    if !calendar.diagnostics().is_empty() {
        println!("\n{}", "Excluded entries".bright_yellow());
        println!("{}", "─".repeat(40).dimmed());
        for diagnostic in calendar.diagnostics() {
            println!("{}", diagnostic.to_string().yellow());
        }
    }
}

fn render_cell(cell: &GridCell) -> String {
    let label = format!("{:>3}", cell.day_of_month_label);
    let mut styled = if cell.has_data {
        label.bright_green().bold()
    } else if cell.is_blank {
        label.normal()
    } else {
        label.dimmed()
    };
    if cell.is_today {
        styled = styled.underline();
    }
    if cell.is_selected {
        styled = styled.reversed();
    }
    styled.to_string()
}
