use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use organizer_core::organizer::Organizer;
use organizer_core::tax::{TaxEstimate, estimate, estimate_from_monthly};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use tracing::debug;

use crate::render::{format_money, format_rate};

pub enum Income {
    Monthly(Decimal),
    Annual(Decimal),
}

pub fn run(organizer: &Organizer, income: Income, deductions: Decimal, year: Option<i32>, json: bool) -> Result<()> {
    let year = year.unwrap_or_else(|| organizer.tax_year(Utc::now().year()));
    let table = organizer.tax_table(year).with_context(|| {
        let years: Vec<String> = organizer.tax_years().iter().map(i32::to_string).collect();
        format!("Available tax years: {}", years.join(", "))
    })?;

    debug!(year, brackets = table.brackets().len(), "estimating tax");
    let result = match income {
        Income::Monthly(monthly) => estimate_from_monthly(monthly, deductions, table)?,
        Income::Annual(annual) => estimate(annual, deductions, table)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print!("{}", render_estimate(year, &result));
    Ok(())
}

fn render_estimate(year: i32, result: &TaxEstimate) -> String {
    let monthly = result.monthly();
    let tax_due = if result.is_exempt {
        format!("{:>16}", "exempt").green().to_string()
    } else {
        format!("{:>16}", format_money(result.tax_due)).yellow().to_string()
    };

    let mut lines = vec![
        format!("Tax year {}", year).bold().to_string(),
        row("Income", &format_money(result.annual_income)),
        row("Deductions", &format_money(result.annual_deductions)),
        row("Taxable base", &format_money(result.taxable_base)),
        format!("  {:<16}{}", "Tax due", tax_due),
        row("Effective rate", &format_rate(result.effective_rate)),
        row("Marginal rate", &format_rate(result.marginal_rate)),
        String::new(),
        "Per month".bold().to_string(),
        row("Income", &format_money(monthly.income)),
        row("Deductions", &format_money(monthly.deductions)),
        row("Taxable base", &format_money(monthly.taxable_base)),
        row("Tax due", &format_money(monthly.tax_due)),
    ];
    lines.push(String::new());
    lines.join("\n")
}

fn row(label: &str, value: &str) -> String {
    format!("  {:<16}{:>16}", label, value)
}
