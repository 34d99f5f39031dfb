pub mod alert;
pub mod event;
pub mod ranger;
pub mod sensor;
