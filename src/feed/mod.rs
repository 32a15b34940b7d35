mod graph;
mod mock;
mod parse;
mod poller;
mod source;
mod status;
mod viewport;

pub use graph::{EdgeKind, GraphEdge, GraphNode, NodeKind, Snapshot, SnapshotOrigin};
pub use mock::mock_snapshot;
pub use parse::parse_snapshot;
pub use poller::{PollJob, Poller};
pub(crate) use source::http_get;
pub use source::{FileSource, HttpSource, LineageSource, SnapshotSource};
pub use status::{ConnectionStatus, SnapshotFeed};
pub use viewport::Viewport;
