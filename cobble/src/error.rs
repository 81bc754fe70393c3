use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Mesh buffer allocation failed; the affected chunk keeps its dirty
    /// bit so the tick driver can retry it.
    #[error("failed to reserve mesh buffers for {vertices} vertices")]
    MeshAllocation {
        vertices: usize,
        #[source]
        source: TryReserveError,
    },
}
