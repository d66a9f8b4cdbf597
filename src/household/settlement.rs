use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::money::Money;

use super::{expense::Expense, participant::ParticipantId, payment::Payment};

/// A balance below this magnitude (in minor units) counts as settled.
pub const SETTLEMENT_EPSILON_MINOR: f64 = 1.0;

/// A participant's net position against the whole group.
///
/// Positive net means the group owes this participant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Balance {
    pub participant: ParticipantId,
    pub net: Money,
}

/// A suggested real-world payment that reduces outstanding balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Money,
}

/// What `a` owes `b` based on recorded split shares and confirmed
/// payments. Positive means `a` owes `b`.
///
/// This is the pairwise debt model; it intentionally differs from
/// [`fair_share_balances`], which measures each participant against the
/// group-wide fair share. The two views answer different questions and
/// are kept as separate functions.
pub fn pairwise_net(
    a: ParticipantId,
    b: ParticipantId,
    expenses: &[Expense],
    payments: &[Payment],
) -> Money {
    let mut net = Money::ZERO;
    for expense in expenses {
        if expense.payer == b {
            if let Some(share) = expense.share_of(a) {
                net += share;
            }
        } else if expense.payer == a {
            if let Some(share) = expense.share_of(b) {
                net -= share;
            }
        }
    }
    for payment in payments.iter().filter(|p| p.is_confirmed()) {
        if payment.from_participant == a && payment.to_participant == b {
            net -= payment.amount;
        } else if payment.from_participant == b && payment.to_participant == a {
            net += payment.amount;
        }
    }
    net
}

/// Net balance per participant against the group fair share.
///
/// Fair share is the total group spend divided evenly by participant
/// count; each raw balance is what the participant paid out minus that
/// share, then adjusted by confirmed payments. Output order follows the
/// `participants` slice. Zero participants yields an empty result.
pub fn fair_share_balances(
    participants: &[ParticipantId],
    expenses: &[Expense],
    payments: &[Payment],
) -> Vec<Balance> {
    raw_balances(participants, expenses, payments)
        .into_iter()
        .zip(participants)
        .map(|(net_minor, &participant)| Balance {
            participant,
            net: Money::round_from_f64(net_minor),
        })
        .collect()
}

/// Greedy debt netting over the fair-share balances.
///
/// Largest debtor pays largest creditor until everyone is within epsilon
/// of zero. Produces at most `min(creditors, debtors)` transfers, which is
/// bounded by one less than the participant count.
pub fn settle(
    participants: &[ParticipantId],
    expenses: &[Expense],
    payments: &[Payment],
) -> Vec<Transfer> {
    let balances = raw_balances(participants, expenses, payments);
    reduce_to_transfers(participants, &balances)
}

fn raw_balances(
    participants: &[ParticipantId],
    expenses: &[Expense],
    payments: &[Payment],
) -> Vec<f64> {
    if participants.is_empty() {
        return Vec::new();
    }

    let index: HashMap<ParticipantId, usize> = participants
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();
    let mut paid_out = vec![0.0f64; participants.len()];
    let mut total_spend = 0.0f64;
    for expense in expenses {
        total_spend += expense.total_amount.as_f64_minor();
        if let Some(&i) = index.get(&expense.payer) {
            paid_out[i] += expense.total_amount.as_f64_minor();
        }
    }

    let fair_share = total_spend / participants.len() as f64;
    let mut balances: Vec<f64> = paid_out.iter().map(|paid| paid - fair_share).collect();

    for payment in payments.iter().filter(|p| p.is_confirmed()) {
        if let Some(&i) = index.get(&payment.from_participant) {
            balances[i] += payment.amount.as_f64_minor();
        }
        if let Some(&i) = index.get(&payment.to_participant) {
            balances[i] -= payment.amount.as_f64_minor();
        }
    }

    balances
}

fn reduce_to_transfers(participants: &[ParticipantId], balances: &[f64]) -> Vec<Transfer> {
    // (participant, remaining) partitioned by sign; the pre-sort is stable
    // so equal amounts keep the original enumeration order.
    let mut creditors: Vec<(ParticipantId, f64)> = Vec::new();
    let mut debtors: Vec<(ParticipantId, f64)> = Vec::new();
    for (&participant, &net) in participants.iter().zip(balances) {
        if net > SETTLEMENT_EPSILON_MINOR {
            creditors.push((participant, net));
        } else if net < -SETTLEMENT_EPSILON_MINOR {
            debtors.push((participant, -net));
        }
    }
    creditors.sort_by(|a, b| b.1.total_cmp(&a.1));
    debtors.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut transfers = Vec::new();
    let mut ci = 0;
    let mut di = 0;
    while ci < creditors.len() && di < debtors.len() {
        let amount = debtors[di].1.min(creditors[ci].1);
        if amount > SETTLEMENT_EPSILON_MINOR {
            transfers.push(Transfer {
                from: debtors[di].0,
                to: creditors[ci].0,
                amount: Money::round_from_f64(amount),
            });
        }
        debtors[di].1 -= amount;
        creditors[ci].1 -= amount;
        if debtors[di].1 < SETTLEMENT_EPSILON_MINOR {
            di += 1;
        }
        if creditors[ci].1 < SETTLEMENT_EPSILON_MINOR {
            ci += 1;
        }
    }

    debug!(
        transfers = transfers.len(),
        creditors = creditors.len(),
        debtors = debtors.len(),
        "settlement reduced"
    );
    transfers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::expense::SplitShare;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()
    }

    fn expense(payer: ParticipantId, total: Money, shares: &[(ParticipantId, Money)]) -> Expense {
        let splits = shares
            .iter()
            .map(|&(participant, amount)| SplitShare {
                participant,
                amount,
            })
            .collect();
        Expense::new("test", total, payer, date(), splits).unwrap()
    }

    #[test]
    fn pairwise_net_offsets_shares_and_payments() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // b paid 100, a's share is 40.
        let e1 = expense(
            b,
            Money::from_major(100),
            &[(b, Money::from_major(60)), (a, Money::from_major(40))],
        );
        // a paid 30, b's share is 15.
        let e2 = expense(
            a,
            Money::from_major(30),
            &[(a, Money::from_major(15)), (b, Money::from_major(15))],
        );
        let mut p = Payment::new(a, b, Money::from_major(10), date());
        p.confirm().unwrap();

        let net = pairwise_net(a, b, &[e1, e2], &[p.clone()]);
        assert_eq!(net, Money::from_major(15));

        // Pending payments are ignored.
        let pending = Payment::new(a, b, Money::from_major(100), date());
        let net = pairwise_net(a, b, &[], &[pending]);
        assert_eq!(net, Money::ZERO);
    }

    #[test]
    fn fair_share_balances_adjust_for_payments() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let people = vec![a, b, c];
        // a paid 90; fair share is 30 each.
        let e = expense(a, Money::from_major(90), &[]);
        let mut p = Payment::new(b, a, Money::from_major(30), date());
        p.confirm().unwrap();

        let balances = fair_share_balances(&people, &[e], &[p]);
        assert_eq!(balances[0].net, Money::from_major(30));
        assert_eq!(balances[1].net, Money::ZERO);
        assert_eq!(balances[2].net, Money::from_minor(-3000));
    }

    #[test]
    fn settle_matches_largest_debtor_with_largest_creditor() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let people = vec![a, b, c];
        let e = expense(a, Money::from_major(90), &[]);

        let transfers = settle(&people, &[e], &[]);
        assert_eq!(transfers.len(), 2);
        for t in &transfers {
            assert_eq!(t.to, a);
            assert_eq!(t.amount, Money::from_major(30));
        }
    }

    #[test]
    fn settle_is_bounded_and_zeroes_balances() {
        let people: Vec<ParticipantId> = (0..6).map(|_| Uuid::new_v4()).collect();
        let expenses: Vec<Expense> = people
            .iter()
            .enumerate()
            .map(|(i, &payer)| expense(payer, Money::from_minor(1000 * (i as i64 + 1) + 37), &[]))
            .collect();

        let transfers = settle(&people, &expenses, &[]);
        assert!(transfers.len() <= people.len() - 1);

        // Apply the transfers and verify everyone lands within epsilon.
        let mut remaining: HashMap<ParticipantId, f64> = people
            .iter()
            .zip(raw_balances(&people, &expenses, &[]))
            .map(|(&id, net)| (id, net))
            .collect();
        for t in &transfers {
            *remaining.get_mut(&t.from).unwrap() += t.amount.as_f64_minor();
            *remaining.get_mut(&t.to).unwrap() -= t.amount.as_f64_minor();
        }
        for net in remaining.values() {
            assert!(net.abs() <= SETTLEMENT_EPSILON_MINOR + 0.5);
        }
    }

    #[test]
    fn settled_group_produces_no_transfers() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let people = vec![a, b];
        let e1 = expense(a, Money::from_major(50), &[]);
        let e2 = expense(b, Money::from_major(50), &[]);
        assert!(settle(&people, &[e1, e2], &[]).is_empty());
        assert!(settle(&people, &[], &[]).is_empty());
    }

    #[test]
    fn no_participants_degrades_to_empty() {
        assert!(fair_share_balances(&[], &[], &[]).is_empty());
        assert!(settle(&[], &[], &[]).is_empty());
    }
}
