//! State machines built on `statig`.

pub mod refresh_sm;
