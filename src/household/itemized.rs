use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{errors::EngineError, money::Money};

use super::{
    expense::SplitShare,
    participant::ParticipantId,
    split::{allocate, SplitMode},
};

/// An item on an itemized bill, attributed to exactly one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub unit_amount: Money,
    pub quantity: u32,
    pub participant: ParticipantId,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.unit_amount.minor() * self.quantity as i64)
    }
}

/// A tax or service charge on an itemized bill.
///
/// The percentage variant is resolved against the bill subtotal; there is
/// no ambiguity between absolute and percentage inputs because only one
/// can be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum ChargeSpec {
    None,
    Absolute(Money),
    Percentage(f64),
}

impl ChargeSpec {
    fn resolve(self, subtotal_sum: Money, label: &str) -> Result<Money, EngineError> {
        match self {
            ChargeSpec::None => Ok(Money::ZERO),
            ChargeSpec::Absolute(amount) => {
                if amount.is_negative() {
                    return Err(EngineError::InvalidChargeSpec(format!(
                        "{label} amount {amount} is negative"
                    )));
                }
                Ok(amount)
            }
            ChargeSpec::Percentage(pct) => {
                if !pct.is_finite() || pct < 0.0 {
                    return Err(EngineError::InvalidChargeSpec(format!(
                        "{label} percentage {pct} is invalid"
                    )));
                }
                Ok(Money::round_from_f64(subtotal_sum.as_f64_minor() * pct / 100.0))
            }
        }
    }
}

/// One participant's slice of an itemized bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantBreakdown {
    pub participant: ParticipantId,
    pub subtotal: Money,
    pub tax_share: Money,
    pub service_share: Money,
    pub total: Money,
}

/// Full breakdown of an itemized bill: the preview structure shown before
/// commit, and the input for the final exact-sum reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillBreakdown {
    pub per_participant: Vec<ParticipantBreakdown>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub service_charge: Money,
    pub grand_total: Money,
}

impl BillBreakdown {
    /// Per-participant rounded totals, keyed for `SplitMode::Amount`.
    pub fn amount_shares(&self) -> HashMap<ParticipantId, Money> {
        self.per_participant
            .iter()
            .map(|p| (p.participant, p.total))
            .collect()
    }

    /// Materializes the final shares for `grand_total`, with `payer` first
    /// so the per-participant rounding drift lands on them and the shares
    /// sum exactly to the grand total.
    pub fn reconciled_shares(
        &self,
        payer: ParticipantId,
    ) -> Result<Vec<SplitShare>, EngineError> {
        let mut order: Vec<ParticipantId> = Vec::with_capacity(self.per_participant.len() + 1);
        order.push(payer);
        order.extend(
            self.per_participant
                .iter()
                .map(|p| p.participant)
                .filter(|id| *id != payer),
        );
        let mut amounts = self.amount_shares();
        amounts.remove(&payer);
        // When the payer consumed nothing, per-participant rounding can
        // push the others past the grand total; the drift comes out a cent
        // at a time from the largest remaining shares, so a tiny share is
        // never driven negative before allocation validates the sum.
        let others_sum: Money = order[1..]
            .iter()
            .filter_map(|id| amounts.get(id))
            .copied()
            .sum();
        let mut overshoot = others_sum - self.grand_total;
        while overshoot > Money::ZERO {
            let mut target: Option<ParticipantId> = None;
            for id in &order[1..] {
                let amount = amounts.get(id).copied().unwrap_or(Money::ZERO);
                if amount > Money::ZERO && target.map_or(true, |t| amount > amounts[&t]) {
                    target = Some(*id);
                }
            }
            let Some(id) = target else { break };
            if let Some(amount) = amounts.get_mut(&id) {
                *amount -= Money::from_minor(1);
            }
            overshoot -= Money::from_minor(1);
        }
        allocate(self.grand_total, &order, &SplitMode::Amount(amounts))
    }
}

/// Computes each participant's subtotal and their proportional slice of
/// the tax and service charges.
///
/// Shares are rounded to minor units exactly once, when the per-participant
/// figures are produced; rates are carried as floats in between to keep
/// cumulative rounding error down. Participant order follows first
/// appearance in `line_items`.
pub fn itemized_breakdown(
    line_items: &[LineItem],
    tax: &ChargeSpec,
    service: &ChargeSpec,
) -> Result<BillBreakdown, EngineError> {
    let mut order: Vec<ParticipantId> = Vec::new();
    let mut subtotals: HashMap<ParticipantId, Money> = HashMap::new();
    for item in line_items {
        let entry = subtotals.entry(item.participant).or_insert_with(|| {
            order.push(item.participant);
            Money::ZERO
        });
        *entry += item.line_total();
    }
    let subtotal_sum: Money = subtotals.values().copied().sum();

    let tax_amount = tax.resolve(subtotal_sum, "tax")?;
    let service_charge = service.resolve(subtotal_sum, "service")?;

    let (tax_rate, service_rate) = if subtotal_sum.is_zero() {
        (0.0, 0.0)
    } else {
        (
            tax_amount.as_f64_minor() / subtotal_sum.as_f64_minor(),
            service_charge.as_f64_minor() / subtotal_sum.as_f64_minor(),
        )
    };

    let per_participant = order
        .iter()
        .map(|&participant| {
            let subtotal = subtotals[&participant];
            let tax_share = Money::round_from_f64(subtotal.as_f64_minor() * tax_rate);
            let service_share = Money::round_from_f64(subtotal.as_f64_minor() * service_rate);
            ParticipantBreakdown {
                participant,
                subtotal,
                tax_share,
                service_share,
                total: subtotal + tax_share + service_share,
            }
        })
        .collect();

    let grand_total = subtotal_sum + tax_amount + service_charge;
    debug!(%subtotal_sum, %tax_amount, %service_charge, %grand_total, "itemized breakdown");

    Ok(BillBreakdown {
        per_participant,
        subtotal: subtotal_sum,
        tax_amount,
        service_charge,
        grand_total,
    })
}
