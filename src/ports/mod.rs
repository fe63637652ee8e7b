//! Port traits: the collaborators the engine talks to.

pub mod balance_port;
pub mod config_port;
pub mod market_data_port;
pub mod notify_port;
pub mod table_port;
