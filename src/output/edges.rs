//! Edge list export
//!
//! The final graph is handed to downstream consumers as a flat edge list,
//! one `source,target` pair per line. Rows are sorted for a readable diff,
//! but consumers must treat the file as a set.

use crate::graph::GraphAccumulator;
use crate::CrawlError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the accumulated edges as CSV to `path`
pub fn write_edge_list(graph: &GraphAccumulator, path: &Path) -> Result<(), CrawlError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let mut edges: Vec<_> = graph.edges().collect();
    edges.sort_unstable();

    writeln!(writer, "source,target")?;
    for (source, target) in edges {
        writeln!(writer, "{},{}", source, target)?;
    }
    writer.flush()?;

    tracing::info!("Edge list written to {}", path.display());
    Ok(())
}
