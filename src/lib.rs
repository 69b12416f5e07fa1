pub mod aggregate;
pub mod aqi;
pub mod cli;
pub mod config;
pub mod cooldown;
pub mod db;
pub mod notify;
pub mod poll;
pub mod purpleair;
pub mod tier;
pub mod twilio;

#[cfg(test)]
mod testing;
