//! Application layer orchestrating one checkout attempt.
//!
//! `checkout` drives the payment protocol against the injected ports and decides
//! which application record to persist, `state` tracks where a submission is,
//! `router` maps the outcome to the next screen and `result_view` loads what the
//! success and failure screens display.

pub mod checkout;
pub mod result_view;
pub mod router;
pub mod state;
