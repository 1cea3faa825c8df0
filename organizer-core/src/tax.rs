//! Progressive income-tax estimate.
//!
//! The bracket table is data, not code: each tax year ships its own
//! [`BracketTable`] (see [`crate::config::TaxTables`]) and the calculator
//! works with any table that passes validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{OrganizerError, OrganizerResult};

const MONTHS_PER_YEAR: u32 = 12;

/// Published tables are rounded to cents, so the next bracket's formula may
/// start up to a cent below the previous one. Larger gaps are rejected.
const BOUNDARY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One bracket in cumulative-subtraction form: `tax = base * rate - deduction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    /// Inclusive upper bound of the bracket. None = no upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    #[serde(default)]
    pub deduction: Decimal,
}

impl Bracket {
    pub fn new(upper_bound: Option<Decimal>, rate: Decimal, deduction: Decimal) -> Self {
        Bracket {
            upper_bound,
            rate,
            deduction,
        }
    }

    fn contains(&self, base: Decimal) -> bool {
        self.upper_bound.is_none_or(|bound| base <= bound)
    }

    fn tax_for(&self, base: Decimal) -> OrganizerResult<Decimal> {
        let gross = base
            .checked_mul(self.rate)
            .ok_or_else(|| OrganizerError::TaxOverflow(format!("{} * {}", base, self.rate)))?;
        Ok((gross - self.deduction).max(Decimal::ZERO))
    }
}

/// A validated, ascending bracket table whose last bracket is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bracket>", into = "Vec<Bracket>")]
pub struct BracketTable {
    brackets: Vec<Bracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<Bracket>) -> OrganizerResult<Self> {
        validate_brackets(&brackets)?;
        Ok(BracketTable { brackets })
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    /// Bracket for `base` (first whose upper bound is at or above it) and the tax due.
    ///
    /// The tax never falls below what the lower brackets reached at their upper
    /// bounds, so a rounded deduction can't make one more cent cheaper.
    fn assess(&self, base: Decimal) -> OrganizerResult<(&Bracket, Decimal)> {
        let mut floor = Decimal::ZERO;

        for bracket in &self.brackets {
            if bracket.contains(base) {
                return Ok((bracket, bracket.tax_for(base)?.max(floor)));
            }
            if let Some(bound) = bracket.upper_bound {
                floor = floor.max(bracket.tax_for(bound)?);
            }
        }

        Err(OrganizerError::InvalidBracketTable(format!(
            "no bracket covers {}",
            base
        )))
    }
}

impl TryFrom<Vec<Bracket>> for BracketTable {
    type Error = OrganizerError;

    fn try_from(brackets: Vec<Bracket>) -> Result<Self, Self::Error> {
        BracketTable::new(brackets)
    }
}

impl From<BracketTable> for Vec<Bracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}

fn validate_brackets(brackets: &[Bracket]) -> OrganizerResult<()> {
    let invalid = |msg: String| Err(OrganizerError::InvalidBracketTable(msg));

    let Some(last) = brackets.last() else {
        return invalid("table has no brackets".into());
    };
    if last.upper_bound.is_some() {
        return invalid("last bracket must have no upper bound".into());
    }

    for (i, bracket) in brackets.iter().enumerate() {
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
            return invalid(format!("bracket {} has rate {} outside [0, 1]", i + 1, bracket.rate));
        }
        if bracket.deduction < Decimal::ZERO {
            return invalid(format!("bracket {} has negative deduction", i + 1));
        }
    }

    for (i, pair) in brackets.windows(2).enumerate() {
        let (lower, upper) = (&pair[0], &pair[1]);

        let Some(bound) = lower.upper_bound else {
            return invalid(format!("only the last bracket may be unbounded (bracket {})", i + 1));
        };
        if let Some(next_bound) = upper.upper_bound {
            if next_bound <= bound {
                return invalid(format!(
                    "upper bounds must be strictly ascending ({} then {})",
                    bound, next_bound
                ));
            }
        }

        // Crossing a boundary must never lower the tax
        let left = lower.tax_for(bound)?;
        let right = upper.tax_for(bound)?;
        if right + BOUNDARY_TOLERANCE < left {
            return invalid(format!(
                "tax drops from {} to {} when crossing {}",
                left, right, bound
            ));
        }
    }

    Ok(())
}

/// Annual tax estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxEstimate {
    pub annual_income: Decimal,
    pub annual_deductions: Decimal,
    pub taxable_base: Decimal,
    pub tax_due: Decimal,
    /// Rate of the bracket the taxable base fell into
    pub marginal_rate: Decimal,
    /// `tax_due / annual_income`, 0 when there is no income
    pub effective_rate: Decimal,
    pub is_exempt: bool,
}

/// Annual figures divided by twelve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTaxView {
    pub income: Decimal,
    pub deductions: Decimal,
    pub taxable_base: Decimal,
    pub tax_due: Decimal,
}

impl TaxEstimate {
    pub fn monthly(&self) -> MonthlyTaxView {
        let months = Decimal::from(MONTHS_PER_YEAR);
        MonthlyTaxView {
            income: self.annual_income / months,
            deductions: self.annual_deductions / months,
            taxable_base: self.taxable_base / months,
            tax_due: self.tax_due / months,
        }
    }
}

/// Estimate annual tax for the given income and deductions.
///
/// Negative inputs are rejected rather than clamped.
pub fn estimate(
    annual_income: Decimal,
    annual_deductions: Decimal,
    table: &BracketTable,
) -> OrganizerResult<TaxEstimate> {
    if annual_income < Decimal::ZERO {
        return Err(OrganizerError::InvalidTaxInput {
            field: "annual_income",
            value: annual_income,
        });
    }
    if annual_deductions < Decimal::ZERO {
        return Err(OrganizerError::InvalidTaxInput {
            field: "annual_deductions",
            value: annual_deductions,
        });
    }

    let taxable_base = (annual_income - annual_deductions).max(Decimal::ZERO);
    let (bracket, tax_due) = table.assess(taxable_base)?;

    let effective_rate = if annual_income > Decimal::ZERO {
        tax_due / annual_income
    } else {
        Decimal::ZERO
    };

    Ok(TaxEstimate {
        annual_income,
        annual_deductions,
        taxable_base,
        tax_due,
        marginal_rate: bracket.rate,
        effective_rate,
        is_exempt: tax_due.is_zero(),
    })
}

/// Estimate from a monthly income figure (annualized as `monthly * 12`).
pub fn estimate_from_monthly(
    monthly_income: Decimal,
    annual_deductions: Decimal,
    table: &BracketTable,
) -> OrganizerResult<TaxEstimate> {
    if monthly_income < Decimal::ZERO {
        return Err(OrganizerError::InvalidTaxInput {
            field: "monthly_income",
            value: monthly_income,
        });
    }
    let annual_income = monthly_income
        .checked_mul(Decimal::from(MONTHS_PER_YEAR))
        .ok_or_else(|| OrganizerError::TaxOverflow(format!("{} * 12", monthly_income)))?;

    estimate(annual_income, annual_deductions, table)
}
