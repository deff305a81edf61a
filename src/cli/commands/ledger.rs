use chrono::NaiveDate;

use super::{parse_amount, usage_error, CommandDefinition, CommandResult};
use crate::{
    cli::{context::ShellContext, output},
    core::services::SummaryService,
    errors::CommandError,
    ledger::{TransactionDraft, CATEGORY_LABELS},
    utils::money::{format_dollars, transactions_label},
};

const ADD_USAGE: &str = "add <amount> <category> <item...> [--vendor <name>] [--date YYYY-MM-DD]";
const DEFAULT_LIST_LIMIT: usize = 20;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("add", "Record an expense", ADD_USAGE, cmd_add),
        CommandDefinition::new("list", "Show recent expenses", "list [limit]", cmd_list),
        CommandDefinition::new("summary", "Totals for the last 30 days", "summary", cmd_summary),
        CommandDefinition::new(
            "categories",
            "Spending by category, last 30 days",
            "categories",
            cmd_categories,
        ),
        CommandDefinition::new(
            "recurring",
            "Repeated purchases in the last 90 days",
            "recurring",
            cmd_recurring,
        ),
        CommandDefinition::new("month", "Spending this calendar month", "month", cmd_month),
        CommandDefinition::new(
            "snapshot",
            "Print the figures the coach sees, as JSON",
            "snapshot",
            cmd_snapshot,
        ),
    ]
}

fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{input}` (use YYYY-MM-DD)"))
    })
}

pub(crate) fn parse_draft(args: &[&str]) -> Result<TransactionDraft, CommandError> {
    let mut positional = Vec::new();
    let mut vendor = None;
    let mut date = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match *arg {
            "--vendor" => vendor = Some(*iter.next().ok_or_else(|| usage_error(ADD_USAGE))?),
            "--date" => {
                let raw = iter.next().ok_or_else(|| usage_error(ADD_USAGE))?;
                date = Some(parse_date(raw)?);
            }
            other => positional.push(other),
        }
    }

    if positional.len() < 3 {
        return Err(usage_error(ADD_USAGE));
    }
    let amount = parse_amount(positional[0])?;
    let item = positional[2..].join(" ");

    let mut draft = TransactionDraft::new(amount, positional[1], item);
    if let Some(vendor) = vendor {
        draft = draft.with_vendor(vendor);
    }
    if let Some(date) = date {
        draft = draft.on(date);
    }
    Ok(draft)
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        output::hint(format!("Categories: {}", CATEGORY_LABELS.join(", ")));
        return Err(usage_error(ADD_USAGE));
    }
    let draft = parse_draft(args)?;
    let txn = context.store.add(draft)?;
    output::success(format!(
        "Added #{}: {} [{}] {}",
        txn.id,
        txn.item,
        txn.category,
        format_dollars(txn.amount)
    ));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let limit = match args.first() {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidArguments(format!("invalid limit `{raw}`")))?,
        None => DEFAULT_LIST_LIMIT,
    };
    let recent = context.store.recent(limit);
    if recent.is_empty() {
        output::info("No expenses recorded yet.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = recent
        .iter()
        .map(|txn| {
            vec![
                format!("#{}", txn.id),
                txn.date
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "-".into()),
                txn.item.clone(),
                txn.vendor_label().unwrap_or("-").to_string(),
                txn.category.clone(),
                format_dollars(txn.amount),
            ]
        })
        .collect();
    output::table(&["ID", "Date", "Item", "Vendor", "Category", "Amount"], &rows);
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = SummaryService::summary(&context.store);
    output::section("Last 30 days");
    output::info(format!("  Total   : {}", format_dollars(summary.total)));
    output::info(format!(
        "  Count   : {} {}",
        summary.count,
        transactions_label(summary.count)
    ));
    output::info(format!("  Average : {}", format_dollars(summary.avg)));
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let buckets = SummaryService::categories(&context.store);
    if buckets.is_empty() {
        output::info("No spending in the last 30 days.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = buckets
        .iter()
        .map(|bucket| {
            vec![
                bucket.category.clone(),
                format_dollars(bucket.amount),
                bucket.count.to_string(),
            ]
        })
        .collect();
    output::table(&["Category", "Amount", "Count"], &rows);
    Ok(())
}

fn cmd_recurring(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let groups = SummaryService::recurring(&context.store);
    if groups.is_empty() {
        output::info("No recurring purchases in the last 90 days.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|group| {
            vec![
                group.name.clone(),
                group.category.clone(),
                group.count.to_string(),
                format_dollars(group.total),
                format_dollars(group.avg),
            ]
        })
        .collect();
    output::table(&["Name", "Category", "Count", "Total", "Average"], &rows);
    Ok(())
}

fn cmd_month(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let total = SummaryService::calendar_month_total(&context.store);
    output::info(format!("This calendar month: {}", format_dollars(total)));
    Ok(())
}

fn cmd_snapshot(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let snapshot = SummaryService::snapshot(&context.store);
    output::info(serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
