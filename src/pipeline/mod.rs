// Pipeline stages over an explicit PipelineState.
//
// `fit` turns raw documents into a Fitted state; `topics` holds the
// clustering, ranking, naming and refinement stages that follow it.

pub mod fit;
pub mod topics;
