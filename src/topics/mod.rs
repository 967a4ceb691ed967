// Topic modeling: terms, clustering, naming, ranking and aggregation.

pub mod aggregate;
pub mod cleaning;
pub mod cluster;
pub mod coherence;
pub mod naming;
pub mod params;
pub mod ranking;
pub mod refine;
pub mod terms;
