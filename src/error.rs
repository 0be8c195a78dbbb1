use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("no edge map has been set; call set_edge_map before detect")]
    NoEdgeMap,

    #[error("edge map gradients are undefined at an edge pixel ({x}, {y})")]
    CorruptEdgeMap { x: u32, y: u32 },
}
