use std::collections::HashMap;

use tracing::debug;

use crate::{errors::EngineError, money::Money};

use super::{expense::SplitShare, participant::ParticipantId};

const PERCENT_SUM_TOLERANCE: f64 = 1e-9;

/// How an expense total is divided among participants.
///
/// Per-participant parameters apply to every participant except the first
/// in the supplied order; the first participant is the remainder holder.
#[derive(Debug, Clone)]
pub enum SplitMode {
    /// Everyone owes the same share, rounded down; the remainder holder
    /// absorbs the leftover cents.
    Equal,
    /// Each non-first participant owes a percentage of the total.
    Percentage(HashMap<ParticipantId, f64>),
    /// Each non-first participant owes a fixed amount.
    Amount(HashMap<ParticipantId, Money>),
}

/// Divides `total` among `participants` under `mode`.
///
/// The first participant (by convention the payer/owner) is the remainder
/// holder: every other share is computed from the mode, and the first
/// share is whatever is left, so the output always sums exactly to
/// `total`. Identical inputs produce identical output; participant order
/// is taken from the slice, never from map iteration.
pub fn allocate(
    total: Money,
    participants: &[ParticipantId],
    mode: &SplitMode,
) -> Result<Vec<SplitShare>, EngineError> {
    let Some((&holder, others)) = participants.split_first() else {
        return Err(EngineError::EmptyParticipantSet);
    };
    if total.is_negative() {
        return Err(EngineError::InvalidSplitConfig(
            "total must not be negative".to_string(),
        ));
    }

    let other_shares: Vec<Money> = match mode {
        SplitMode::Equal => {
            let per_head = Money::from_minor(total.minor() / participants.len() as i64);
            others.iter().map(|_| per_head).collect()
        }
        SplitMode::Percentage(percentages) => {
            let mut shares = Vec::with_capacity(others.len());
            let mut pct_sum = 0.0f64;
            for participant in others {
                let pct = *percentages.get(participant).ok_or_else(|| {
                    EngineError::InvalidSplitConfig(format!(
                        "missing percentage for participant {participant}"
                    ))
                })?;
                if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                    return Err(EngineError::InvalidSplitConfig(format!(
                        "percentage {pct} is outside 0-100"
                    )));
                }
                pct_sum += pct;
                shares.push(Money::round_from_f64(total.as_f64_minor() * pct / 100.0));
            }
            if pct_sum > 100.0 + PERCENT_SUM_TOLERANCE {
                return Err(EngineError::InvalidSplitConfig(
                    "others' percentages cannot exceed 100%".to_string(),
                ));
            }
            shares
        }
        SplitMode::Amount(amounts) => {
            let mut shares = Vec::with_capacity(others.len());
            let mut sum = Money::ZERO;
            for participant in others {
                let amount = *amounts.get(participant).ok_or_else(|| {
                    EngineError::InvalidSplitConfig(format!(
                        "missing amount for participant {participant}"
                    ))
                })?;
                if amount.is_negative() {
                    return Err(EngineError::InvalidSplitConfig(format!(
                        "amount {amount} is negative"
                    )));
                }
                sum += amount;
                shares.push(amount);
            }
            if sum > total {
                return Err(EngineError::InvalidSplitConfig(
                    "others' amounts cannot exceed the total".to_string(),
                ));
            }
            shares
        }
    };

    let assigned: Money = other_shares.iter().copied().sum();
    let remainder = total - assigned;
    debug!(
        %total,
        participants = participants.len(),
        %remainder,
        "allocated split"
    );

    let mut shares = Vec::with_capacity(participants.len());
    shares.push(SplitShare {
        participant: holder,
        // Percentage rounding can nudge the assigned sum past the total by
        // a cent; the holder share is clamped at zero in that case.
        amount: if remainder.is_negative() {
            Money::ZERO
        } else {
            remainder
        },
    });
    for (participant, amount) in others.iter().zip(other_shares) {
        shares.push(SplitShare {
            participant: *participant,
            amount,
        });
    }

    // Rounding pushed the others past the total; shave the overshoot a
    // cent at a time off the largest non-first positive shares, so the
    // sum invariant holds and no share goes below zero. Every up-rounded
    // share is at least a cent, so the overshoot is always coverable.
    let sum: Money = shares.iter().map(|s| s.amount).sum();
    let mut overshoot = sum - total;
    while overshoot > Money::ZERO {
        let mut target: Option<usize> = None;
        for (i, share) in shares.iter().enumerate().skip(1) {
            if share.amount > Money::ZERO
                && target.map_or(true, |t| share.amount > shares[t].amount)
            {
                target = Some(i);
            }
        }
        let Some(i) = target else { break };
        shares[i].amount -= Money::from_minor(1);
        overshoot -= Money::from_minor(1);
    }

    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ids(n: usize) -> Vec<ParticipantId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn equal_split_gives_remainder_to_first() {
        let people = ids(3);
        let shares = allocate(Money::from_major(100), &people, &SplitMode::Equal).unwrap();
        assert_eq!(shares[0].amount, Money::from_minor(3334));
        assert_eq!(shares[1].amount, Money::from_minor(3333));
        assert_eq!(shares[2].amount, Money::from_minor(3333));
    }

    #[test]
    fn sum_invariant_holds_for_awkward_totals() {
        for count in 1..=50 {
            let people = ids(count);
            let total = Money::from_minor(10_000 + count as i64 * 7);
            let shares = allocate(total, &people, &SplitMode::Equal).unwrap();
            let sum: Money = shares.iter().map(|s| s.amount).sum();
            assert_eq!(sum, total, "count {count}");
        }
    }

    #[test]
    fn percentage_split_rounds_and_first_absorbs() {
        let people = ids(3);
        let mut pct = HashMap::new();
        pct.insert(people[1], 30.0);
        pct.insert(people[2], 20.0);
        let shares = allocate(Money::from_major(250), &people, &SplitMode::Percentage(pct)).unwrap();
        assert_eq!(shares[0].amount, Money::from_major(125));
        assert_eq!(shares[1].amount, Money::from_major(75));
        assert_eq!(shares[2].amount, Money::from_major(50));
    }

    #[test]
    fn sub_cent_percentage_rounding_keeps_shares_non_negative() {
        let people = ids(5);
        let mut pct = HashMap::new();
        for person in &people[1..] {
            pct.insert(*person, 25.0);
        }
        let total = Money::from_minor(2);
        let shares = allocate(total, &people, &SplitMode::Percentage(pct)).unwrap();
        let sum: Money = shares.iter().map(|s| s.amount).sum();
        assert_eq!(sum, total);
        assert!(shares.iter().all(|s| s.amount >= Money::ZERO));
    }

    #[test]
    fn percentage_over_100_is_rejected() {
        let people = ids(3);
        let mut pct = HashMap::new();
        pct.insert(people[1], 70.0);
        pct.insert(people[2], 40.0);
        let result = allocate(Money::from_major(100), &people, &SplitMode::Percentage(pct));
        assert!(matches!(result, Err(EngineError::InvalidSplitConfig(_))));
    }

    #[test]
    fn amounts_over_total_are_rejected() {
        let people = ids(2);
        let mut amounts = HashMap::new();
        amounts.insert(people[1], Money::from_major(120));
        let result = allocate(Money::from_major(100), &people, &SplitMode::Amount(amounts));
        assert!(matches!(result, Err(EngineError::InvalidSplitConfig(_))));
    }

    #[test]
    fn amount_split_passes_fixed_amounts_through() {
        let people = ids(3);
        let mut amounts = HashMap::new();
        amounts.insert(people[1], Money::from_minor(3325));
        amounts.insert(people[2], Money::from_minor(1999));
        let total = Money::from_major(90);
        let shares = allocate(total, &people, &SplitMode::Amount(amounts)).unwrap();
        assert_eq!(shares[1].amount, Money::from_minor(3325));
        assert_eq!(shares[2].amount, Money::from_minor(1999));
        assert_eq!(shares[0].amount, total - Money::from_minor(5324));
    }

    #[test]
    fn empty_participants_is_an_error() {
        let result = allocate(Money::from_major(10), &[], &SplitMode::Equal);
        assert!(matches!(result, Err(EngineError::EmptyParticipantSet)));
    }

    #[test]
    fn single_participant_takes_everything() {
        let people = ids(1);
        let shares = allocate(Money::from_minor(999), &people, &SplitMode::Equal).unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].amount, Money::from_minor(999));
    }
}
