mod diameter;
mod identity;
mod pipeline;
mod pressure;
mod records;
mod router;
mod run;
pub(crate) mod store;
mod thermal;

pub use run::run;
