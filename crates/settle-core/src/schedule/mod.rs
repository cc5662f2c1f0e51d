pub mod cadence;
pub mod calculator;

pub use cadence::InstallmentCadence;
pub use calculator::{
    build_schedule, generate_schedule, InstallmentTerms, ScheduleInput, ScheduleOutput, MAX_INSTALLMENTS,
};
