use std::error::Error;

use clap::Parser;
use rusqlite::Connection;
use serde_json::json;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use spendlens::{
    OwnerId, PeriodKey, Subscription, build_dashboard, catch_up_renewal, detect_candidates,
    insight_message, month_over_month, now_in, rolling_comparison, spending_cadence,
    stores::{BudgetStore, SubscriptionStore, TransactionStore, sqlite::create_stores},
    summarize_subscriptions, total_monthly_cost, track_budgets,
};

/// Renders a spending report for one user as JSON on stdout.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The owner whose transactions are reported on.
    #[arg(long, short)]
    owner: String,

    /// Canonical timezone used to resolve the current date (e.g. 'Australia/Sydney').
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Overall spending limit for the current month.
    #[arg(long, default_value_t = 0.0)]
    monthly_budget: f64,

    /// Income for the current month, used for the savings figures.
    #[arg(long, default_value_t = 0.0)]
    monthly_income: f64,

    /// Days per window in the rolling spending comparison.
    #[arg(long, default_value_t = 7)]
    comparison_days: i64,
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let reference_now = now_in(&args.timezone)
        .ok_or_else(|| spendlens::Error::InvalidTimezone(args.timezone.clone()))?;

    let connection = Connection::open(&args.db_path)?;
    let stores = create_stores(connection)?;
    let owner = OwnerId::new(&args.owner);

    let history = stores.transactions.get_query(&owner, Default::default())?;

    // Sections degrade independently: a failing aggregate is logged and
    // emitted as null instead of taking down the whole report.
    let dashboard = build_dashboard(
        &history,
        reference_now,
        args.monthly_budget,
        args.monthly_income,
    )
    .inspect_err(|error| tracing::error!("could not build the dashboard section: {error}"))
    .ok();

    let period = PeriodKey::from_date(reference_now.date());
    let budgets = stores
        .budgets
        .list(&owner, period)
        .map(|budgets| track_budgets(&budgets, &history, reference_now.offset()))
        .inspect_err(|error| tracing::error!("could not build the budget section: {error}"))
        .ok();

    let subscriptions = stores
        .subscriptions
        .list(&owner)
        .map(|subscriptions| {
            let today = reference_now.date();
            let subscriptions: Vec<Subscription> = subscriptions
                .into_iter()
                .map(|mut subscription| {
                    subscription.next_renewal_on = catch_up_renewal(
                        subscription.next_renewal_on,
                        subscription.frequency,
                        today,
                    );
                    subscription
                })
                .collect();
            let summary = summarize_subscriptions(&subscriptions);

            json!({ "items": subscriptions, "summary": summary })
        })
        .inspect_err(|error| tracing::error!("could not build the subscription section: {error}"))
        .ok();

    let candidates = detect_candidates(&history);
    let detected_subscriptions = json!({
        "total_monthly_cost": total_monthly_cost(&candidates),
        "candidates": candidates,
    });

    let comparison = month_over_month(&history, reference_now);
    let insights = json!({
        "month_over_month": comparison,
        "message": insight_message(&comparison),
        "rolling_comparison": rolling_comparison(&history, reference_now, args.comparison_days),
        "spending_cadence": spending_cadence(&history, reference_now),
    });

    let report = json!({
        "generated_at": reference_now,
        "owner": args.owner,
        "dashboard": dashboard,
        "budgets": budgets,
        "subscriptions": subscriptions,
        "detected_subscriptions": detected_subscriptions,
        "insights": insights,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn setup_logging() {
    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(
            filter::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter::EnvFilter::new("info")),
        ))
        .init();
}
