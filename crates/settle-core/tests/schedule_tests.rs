use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use settle_core::schedule::{
    build_schedule, generate_schedule, InstallmentCadence, InstallmentTerms, ScheduleInput,
};
use settle_core::FixedClock;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn terms(n: u32, last: Option<Decimal>, first: NaiveDate, cadence: InstallmentCadence) -> InstallmentTerms {
    InstallmentTerms {
        number_of_installments: n,
        monthly_amount: dec!(25),
        last_installment_amount: last,
        first_payment_date: first,
        cadence,
    }
}

const CADENCES: [InstallmentCadence; 4] = [
    InstallmentCadence::Weekly,
    InstallmentCadence::Biweekly,
    InstallmentCadence::Semimonthly,
    InstallmentCadence::Monthly,
];

// ===========================================================================
// Length and ordering
// ===========================================================================

#[test]
fn test_length_and_strict_ordering_for_every_cadence() {
    let starts = [d(2024, 1, 31), d(2024, 2, 29), d(2025, 6, 15), d(2025, 12, 1), d(2025, 8, 30)];
    for cadence in CADENCES {
        for first in starts {
            for n in [1u32, 2, 7, 24] {
                for last in [None, Some(dec!(3.10))] {
                    let t = terms(n, last, first, cadence);
                    let sched = generate_schedule(&t, first, false);
                    let expected = n as usize + usize::from(last.is_some());
                    assert_eq!(sched.len(), expected, "{cadence} from {first} n={n}");
                    assert!(
                        sched.windows(2).all(|w| w[0].due_date < w[1].due_date),
                        "{cadence} from {first} is not strictly increasing"
                    );
                    assert_eq!(sched[0].due_date, first);
                }
            }
        }
    }
}

// ===========================================================================
// Month-end anchoring
// ===========================================================================

#[test]
fn test_monthly_from_jan_31_stays_on_month_ends() {
    let t = terms(6, None, d(2025, 1, 31), InstallmentCadence::Monthly);
    let dates: Vec<NaiveDate> = generate_schedule(&t, d(2025, 1, 1), false)
        .into_iter()
        .map(|p| p.due_date)
        .collect();
    assert_eq!(
        dates,
        vec![
            d(2025, 1, 31),
            d(2025, 2, 28),
            d(2025, 3, 31),
            d(2025, 4, 30),
            d(2025, 5, 31),
            d(2025, 6, 30),
        ]
    );
}

#[test]
fn test_monthly_from_leap_february_end() {
    let t = terms(3, Some(dec!(5)), d(2024, 2, 29), InstallmentCadence::Monthly);
    let sched = generate_schedule(&t, d(2024, 2, 1), false);
    assert_eq!(sched[1].due_date, d(2024, 3, 31));
    assert_eq!(sched[2].due_date, d(2024, 4, 30));
    // Final payment sits one step after the last installment
    assert_eq!(sched[3].due_date, d(2024, 5, 31));
    assert_eq!(sched[3].amount, dec!(5));
}

// ===========================================================================
// Amounts
// ===========================================================================

#[test]
fn test_installment_sum_excludes_final_payment() {
    let t = InstallmentTerms {
        number_of_installments: 5,
        monthly_amount: dec!(14.45),
        last_installment_amount: Some(dec!(12.75)),
        first_payment_date: d(2025, 6, 2),
        cadence: InstallmentCadence::Biweekly,
    };
    let sched = generate_schedule(&t, d(2025, 6, 2), false);
    let regular: Decimal = sched[..5].iter().map(|p| p.amount).sum();
    assert_eq!(regular, dec!(72.25));
    assert_eq!(sched[5].amount, dec!(12.75));
    assert_eq!(regular + sched[5].amount, dec!(85.00));
}

// ===========================================================================
// Clamping past start dates
// ===========================================================================

#[test]
fn test_past_start_matches_today_start_without_payment_setup() {
    let today = d(2025, 6, 10);
    for cadence in CADENCES {
        let past = terms(4, Some(dec!(1)), d(2025, 5, 1), cadence);
        let now = terms(4, Some(dec!(1)), today, cadence);
        assert_eq!(
            generate_schedule(&past, today, false),
            generate_schedule(&now, today, false),
            "{cadence}"
        );
        assert_ne!(
            generate_schedule(&past, today, true),
            generate_schedule(&now, today, true),
            "{cadence}"
        );
    }
}

#[test]
fn test_future_start_is_not_moved() {
    let t = terms(2, None, d(2025, 7, 1), InstallmentCadence::Weekly);
    let sched = generate_schedule(&t, d(2025, 6, 10), false);
    assert_eq!(sched[0].due_date, d(2025, 7, 1));
    assert_eq!(sched[1].due_date, d(2025, 7, 8));
}

#[test]
fn test_build_schedule_envelope() {
    let input = ScheduleInput {
        terms: terms(3, None, d(2025, 6, 10), InstallmentCadence::Semimonthly),
        payment_setup: false,
    };
    let out = build_schedule(&input, &FixedClock(d(2025, 6, 1))).unwrap();
    assert_eq!(out.methodology, "Installment Schedule");
    assert!(out.warnings.is_empty());
    assert_eq!(out.result.total_amount, dec!(75));
    assert_eq!(out.result.last_due_date, Some(d(2025, 7, 15)));
    assert!(!out.result.start_was_clamped);
}

#[test]
fn test_schedule_input_from_json() {
    let input: ScheduleInput = serde_json::from_str(
        r#"{
            "number_of_installments": 2,
            "monthly_amount": "50.00",
            "last_installment_amount": "0.01",
            "first_payment_date": "2025-01-31",
            "cadence": "monthly",
            "payment_setup": true
        }"#,
    )
    .unwrap();
    assert!(input.payment_setup);
    let out = build_schedule(&input, &FixedClock(d(2025, 3, 1))).unwrap();
    let dates: Vec<NaiveDate> = out.result.payments.iter().map(|p| p.due_date).collect();
    assert_eq!(dates, vec![d(2025, 1, 31), d(2025, 2, 28), d(2025, 3, 31)]);
    assert_eq!(out.result.total_amount, dec!(100.01));
}
