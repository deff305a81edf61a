use uuid::Uuid;

use super::{parse_amount, usage_error, CommandDefinition, CommandResult};
use crate::{
    cli::{context::ShellContext, output},
    core::services::SummaryService,
    errors::CommandError,
    ledger::{total_monthly_commitment, BillCycle, ManualBill},
    utils::money::format_dollars,
};

const USAGE: &str =
    "bills [list|add <name> <amount> [weekly|monthly|yearly] [category]|remove <id>|samples|total]";
const DEFAULT_BILL_CATEGORY: &str = "Other";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "bills",
        "Manage subscriptions and fixed bills",
        USAGE,
        cmd_bills,
    )]
}

fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}

fn cmd_bills(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["list"] => list(context),
        ["add", name, amount, rest @ ..] => add(context, name, amount, rest),
        ["remove", id] => remove(context, id),
        ["samples"] => {
            let added = context.bills.add_samples()?;
            output::success(format!("Added {added} sample bill(s)."));
            Ok(())
        }
        ["total"] => total(context),
        _ => Err(usage_error(USAGE)),
    }
}

fn list(context: &ShellContext) -> CommandResult {
    let bills = context.bills.list();
    if bills.is_empty() {
        output::info("No bills yet. Try `bills samples` or `bills add`.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = bills
        .iter()
        .map(|bill| {
            vec![
                short_id(bill.id),
                bill.name.clone(),
                format!("{}{}", format_dollars(bill.amount), bill.cycle.suffix()),
                bill.category.clone(),
                format_dollars(bill.monthly_equivalent()),
            ]
        })
        .collect();
    output::table(&["ID", "Name", "Amount", "Category", "Monthly"], &rows);
    Ok(())
}

fn add(context: &mut ShellContext, name: &str, amount: &str, rest: &[&str]) -> CommandResult {
    let amount = parse_amount(amount)?;
    let (cycle, category) = match rest {
        [] => (BillCycle::default(), DEFAULT_BILL_CATEGORY),
        [cycle] => (parse_cycle(cycle)?, DEFAULT_BILL_CATEGORY),
        [cycle, category] => (parse_cycle(cycle)?, *category),
        _ => return Err(usage_error(USAGE)),
    };
    let bill = ManualBill::new(name, amount, cycle, category)?;
    let label = format!(
        "{} {}{}",
        bill.name,
        format_dollars(bill.amount),
        bill.cycle.suffix()
    );
    context.bills.add(bill)?;
    output::success(format!("Added bill {label}."));
    Ok(())
}

fn parse_cycle(raw: &str) -> Result<BillCycle, CommandError> {
    raw.parse().map_err(CommandError::InvalidArguments)
}

fn remove(context: &mut ShellContext, raw: &str) -> CommandResult {
    let needle = raw.trim().to_lowercase();
    let matches: Vec<Uuid> = context
        .bills
        .list()
        .iter()
        .filter(|bill| {
            bill.id.to_string() == needle || bill.id.simple().to_string().starts_with(&needle)
        })
        .map(|bill| bill.id)
        .collect();

    let id = match matches.as_slice() {
        [id] => *id,
        [] => return Err(CommandError::Message(format!("no bill with id `{raw}`"))),
        _ => {
            return Err(CommandError::InvalidArguments(format!(
                "id `{raw}` is ambiguous; use more characters"
            )))
        }
    };
    if context.bills.remove(id)? {
        output::success(format!("Removed bill {}.", short_id(id)));
    }
    Ok(())
}

fn total(context: &ShellContext) -> CommandResult {
    let detected = SummaryService::recurring(&context.store);
    let total = total_monthly_commitment(context.bills.list(), &detected);
    output::info(format!(
        "Monthly commitment: {} ({} bill(s), {} detected recurring)",
        format_dollars(total),
        context.bills.list().len(),
        detected.len()
    ));
    Ok(())
}
