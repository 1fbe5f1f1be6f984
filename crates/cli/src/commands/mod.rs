pub mod coach;
pub mod doctor;
pub mod gateway;
pub mod ledger;
pub mod onboard;
