pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod fakes;
