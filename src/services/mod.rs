pub mod accounts;
pub mod balance_history;
pub mod resample;
pub mod special_balances;
