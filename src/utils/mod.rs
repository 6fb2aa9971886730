//! The `utils` module holds the pieces shared by every layer of `rafflecast`:
//! the error taxonomy surfaced by the registry and the logging bootstrap.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests;
