mod auth;
mod balance;
mod helpers;
pub(crate) mod mocks;
mod orders;
