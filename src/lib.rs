pub mod clock;
pub mod columnar;
pub mod config;
pub mod dashboard;
pub mod eda;
pub mod error;
pub mod export;
pub mod formations;
pub mod freeze_frame;
pub mod period_lineups;
pub mod persist;
pub mod polymarket;
pub mod print;
pub mod position_type;
pub mod possession;
pub mod statsbomb;
pub mod store;
