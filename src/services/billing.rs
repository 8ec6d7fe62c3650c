//! Cálculo de duración y costo de un alquiler
//!
//! Reglas de facturación: se cuentan horas enteras entre alquiler y
//! devolución, se redondea hacia arriba al día y se cobra mínimo un día.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Días facturables entre el alquiler y la devolución
pub fn rental_days(rent_time: DateTime<Utc>, return_time: DateTime<Utc>) -> i64 {
    let hours = (return_time - rent_time).num_hours().max(0);
    let days = (hours + 23) / 24;
    days.max(1)
}

/// Días facturables y costo total a la tarifa diaria dada
pub fn rental_charge(
    rent_time: DateTime<Utc>,
    return_time: DateTime<Utc>,
    rent_per_day: Decimal,
) -> (i64, Decimal) {
    let days = rental_days(rent_time, return_time);
    (days, Decimal::from(days) * rent_per_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(base: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
        base + offset
    }

    #[test]
    fn twenty_five_hours_bills_two_days() {
        let t0 = Utc::now();
        let (days, cost) = rental_charge(t0, at(t0, Duration::hours(25)), Decimal::from(50));
        assert_eq!(days, 2);
        assert_eq!(cost, Decimal::from(100));
    }

    #[test]
    fn exactly_twenty_four_hours_bills_one_day() {
        let t0 = Utc::now();
        let (days, cost) = rental_charge(t0, at(t0, Duration::hours(24)), Decimal::from(50));
        assert_eq!(days, 1);
        assert_eq!(cost, Decimal::from(50));
    }

    #[test]
    fn one_minute_bills_minimum_one_day() {
        let t0 = Utc::now();
        let (days, cost) = rental_charge(t0, at(t0, Duration::minutes(1)), Decimal::from(50));
        assert_eq!(days, 1);
        assert_eq!(cost, Decimal::from(50));
    }

    #[test]
    fn clock_skew_never_bills_negative() {
        let t0 = Utc::now();
        let (days, _) = rental_charge(t0, at(t0, Duration::hours(-3)), Decimal::from(50));
        assert_eq!(days, 1);
    }

    #[test]
    fn exact_decimal_rate() {
        let t0 = Utc::now();
        let rate = Decimal::new(5550, 2); // 55.50
        let (days, cost) = rental_charge(t0, at(t0, Duration::hours(49)), rate);
        assert_eq!(days, 3);
        assert_eq!(cost, Decimal::new(16650, 2)); // 166.50
    }
}
