use rust_decimal::{Decimal, RoundingStrategy};

/// Service for calculating stay prices and cancellation figures
pub struct PriceCalculator;

impl PriceCalculator {
    /// Round a money amount to cents, half away from zero
    pub fn round_money(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Total charge for a stay
    ///
    /// # Arguments
    /// * `nightly_rate` - Snapshot rate for the stay
    /// * `nights` - Number of nights (negative counts are treated as zero)
    ///
    /// # Returns
    /// `nightly_rate * nights`, rounded once to two decimals
    pub fn stay_total(nightly_rate: Decimal, nights: i64) -> Decimal {
        Self::round_money(nightly_rate * Decimal::from(nights.max(0)))
    }

    /// Fee retained on cancellation: the base fee, plus one night when the
    /// cancellation is late or the stay touches a special event
    pub fn cancellation_fee(base_fee: Decimal, nightly_rate: Decimal, charge_one_night: bool) -> Decimal {
        let fee = if charge_one_night {
            base_fee + nightly_rate
        } else {
            base_fee
        };
        Self::round_money(fee)
    }

    /// Refund owed after keeping the fee; never negative
    pub fn refund(amount_paid: Decimal, fee: Decimal) -> Decimal {
        Self::round_money((amount_paid - fee).max(Decimal::ZERO))
    }

    /// Difference between a re-priced stay and the previous amount
    pub fn adjustment(previous: Decimal, current: Decimal) -> Decimal {
        Self::round_money(current - previous)
    }
}
