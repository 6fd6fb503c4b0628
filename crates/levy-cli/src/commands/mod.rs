pub mod check;
pub mod dispatch;
pub mod history;
pub mod retrain;
pub mod schedule;
pub mod simulate;
