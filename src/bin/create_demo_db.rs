use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Month, OffsetDateTime, Time, error::ComponentRange};

use spendlens::{
    CategoryName, Frequency, NewSubscription, OwnerId, PeriodKey, Transaction, TransactionKind,
    stores::{BudgetStore, SubscriptionStore, TransactionStore, sqlite::create_stores},
};

/// A utility for creating a demo database for the spendlens report tool.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database with three months of demo data.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    let mut stores = create_stores(connection)?;
    let store = &mut stores.transactions;
    let owner = OwnerId::new("demo");
    let today = OffsetDateTime::now_utc().date();

    println!("Creating transactions...");

    for months_back in (0..3).rev() {
        let month = months_ago(today, months_back);

        let wages = Transaction::build(owner.clone(), TransactionKind::Income, 2600.0, "Wages")?
            .occurred_at(midday(month, 1)?);
        store.create(wages)?;

        expense(store, &owner, 950.0, "Rent", month, 1, None)?;
        expense(store, &owner, 29.9, "Health", month, 2, Some("Gym membership"))?;
        expense(store, &owner, 15.99, "Entertainment", month, 15, Some("Netflix"))?;
    }

    let two_months_ago = months_ago(today, 2);
    expense(store, &owner, 195.2, "Groceries", two_months_ago, 8, None)?;
    expense(store, &owner, 600.0, "Holiday", two_months_ago, 22, None)?;

    let last_month = months_ago(today, 1);
    expense(store, &owner, 210.75, "Groceries", last_month, 6, None)?;
    expense(store, &owner, 120.4, "Utilities", last_month, 18, None)?;
    expense(store, &owner, 82.3, "Eating Out", last_month, 20, None)?;

    let this_month = months_ago(today, 0);
    expense(store, &owner, 180.5, "Groceries", this_month, 3, None)?;
    expense(store, &owner, 92.4, "Groceries", this_month, 10, None)?;
    expense(store, &owner, 60.0, "Transport", this_month, 5, None)?;
    expense(store, &owner, 45.0, "Eating Out", this_month, 11, None)?;

    // One soft-deleted row so the report demonstrates that deleted
    // transactions are excluded.
    let mistake = expense(store, &owner, 999.0, "Mistake", this_month, 4, None)?;
    store.soft_delete(&owner, mistake.id)?;

    println!("Creating budgets...");

    let period = PeriodKey::from_date(today);
    stores
        .budgets
        .create(&owner, CategoryName::new("Groceries")?, 400.0, period)?;
    stores
        .budgets
        .create(&owner, CategoryName::new("Eating Out")?, 150.0, period)?;
    stores
        .budgets
        .create(&owner, CategoryName::new("Transport")?, 120.0, period)?;

    println!("Creating subscriptions...");

    stores.subscriptions.create(NewSubscription {
        owner: owner.clone(),
        name: "Netflix".to_string(),
        amount: 15.99,
        category: "Entertainment".to_string(),
        frequency: Frequency::Monthly,
        started_on: two_months_ago.replace_day(15)?,
        note: Some("family plan".to_string()),
    })?;
    stores.subscriptions.create(NewSubscription {
        owner: owner.clone(),
        name: "Gym".to_string(),
        amount: 29.9,
        category: "Health".to_string(),
        frequency: Frequency::Monthly,
        started_on: two_months_ago.replace_day(2)?,
        note: None,
    })?;
    let paused = stores.subscriptions.create(NewSubscription {
        owner: owner.clone(),
        name: "Newspaper".to_string(),
        amount: 12.5,
        category: "News".to_string(),
        frequency: Frequency::Weekly,
        started_on: two_months_ago,
        note: None,
    })?;
    stores.subscriptions.set_active(&owner, paused.id, false)?;

    println!("Success!");

    Ok(())
}

/// The first day of the month `months` before the month containing `reference`.
fn months_ago(reference: Date, months: u32) -> Date {
    let mut year = reference.year();
    let mut month = reference.month();

    for _ in 0..months {
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    Date::from_calendar_date(year, month, 1).expect("the first of a month is always valid")
}

/// Midday on the given day of `month`, so demo rows never straddle midnight.
fn midday(month: Date, day: u8) -> Result<OffsetDateTime, ComponentRange> {
    Ok(OffsetDateTime::new_utc(
        month.replace_day(day)?,
        Time::from_hms(12, 0, 0).expect("midday is a valid time"),
    ))
}

fn expense(
    store: &mut impl TransactionStore,
    owner: &OwnerId,
    amount: f64,
    category: &str,
    month: Date,
    day: u8,
    note: Option<&str>,
) -> Result<Transaction, Box<dyn Error>> {
    let mut builder = Transaction::build(owner.clone(), TransactionKind::Expense, amount, category)?
        .occurred_at(midday(month, day)?);

    if let Some(note) = note {
        builder = builder.note(note);
    }

    Ok(store.create(builder)?)
}
