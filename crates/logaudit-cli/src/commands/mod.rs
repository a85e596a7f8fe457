pub(crate) mod audit;
pub(crate) mod helpers;
pub(crate) mod suite;
