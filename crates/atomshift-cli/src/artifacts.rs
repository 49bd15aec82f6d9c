//! Per-cluster dump artifacts and the run summary

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use atomshift_core::{ClusteringResponse, ClusteringResult, Result};
use serde::Serialize;

use crate::dump::DumpSnapshot;

/// Paths written for one run, split by fate
#[derive(Debug, Default)]
pub struct WrittenArtifacts {
    /// Accepted clusters, kept unconditionally
    pub finals: Vec<PathBuf>,
    /// Non-accepted nodes, removed when `limpiar_intermedios` is set
    pub intermediates: Vec<PathBuf>,
}

/// Writes per-node dump files and the JSON summary into the output
/// directory.
///
/// Artifacts reuse the input snapshot's format: same timestep and box
/// bounds, atoms restricted to the node's indices.
pub struct ArtifactWriter<'a> {
    output_dir: &'a Path,
    snapshot: &'a DumpSnapshot,
}

impl<'a> ArtifactWriter<'a> {
    /// Create a writer, ensuring the output directory exists
    pub fn new(output_dir: &'a Path, snapshot: &'a DumpSnapshot) -> Result<Self> {
        fs::create_dir_all(output_dir)?;
        Ok(Self { output_dir, snapshot })
    }

    /// Write one dump file per tree node.
    ///
    /// Final clusters land at `<name>.dump`, everything else at
    /// `<name>_intermedio.dump`.
    pub fn write_all(&self, result: &ClusteringResult) -> Result<WrittenArtifacts> {
        let mut written = WrittenArtifacts::default();
        for f in &result.clusters_finales {
            let path = self.write_node(&format!("{}.dump", f.record.name), f.node, result)?;
            written.finals.push(path);
        }
        for named in &result.intermediates {
            let path =
                self.write_node(&format!("{}_intermedio.dump", named.name), named.node, result)?;
            written.intermediates.push(path);
        }
        tracing::info!(
            finals = written.finals.len(),
            intermediates = written.intermediates.len(),
            "artifacts written"
        );
        Ok(written)
    }

    /// Delete the intermediate artifacts of a finished run
    pub fn remove_intermediates(&self, written: &WrittenArtifacts) -> Result<()> {
        for path in &written.intermediates {
            fs::remove_file(path)?;
        }
        tracing::info!(removed = written.intermediates.len(), "intermediates cleaned up");
        Ok(())
    }

    /// Write the response payload as `clustering_summary.json`
    pub fn write_summary(&self, response: &ClusteringResponse) -> Result<PathBuf> {
        #[derive(Serialize)]
        struct Summary<'r> {
            generated_at: String,
            #[serde(flatten)]
            response: &'r ClusteringResponse,
        }

        let path = self.output_dir.join("clustering_summary.json");
        let summary = Summary {
            generated_at: chrono::Utc::now().to_rfc3339(),
            response,
        };
        fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
        Ok(path)
    }

    fn write_node(&self, filename: &str, node: usize, result: &ClusteringResult) -> Result<PathBuf> {
        let indices = &result.tree.node(node).indices;
        let points = &self.snapshot.points;
        let path = self.output_dir.join(filename);

        let mut out = fs::File::create(&path)?;
        writeln!(out, "ITEM: TIMESTEP")?;
        writeln!(out, "{}", self.snapshot.timestep)?;
        writeln!(out, "ITEM: NUMBER OF ATOMS")?;
        writeln!(out, "{}", indices.len())?;
        if self.snapshot.bounds_style.is_empty() {
            writeln!(out, "ITEM: BOX BOUNDS")?;
        } else {
            writeln!(out, "ITEM: BOX BOUNDS {}", self.snapshot.bounds_style)?;
        }
        for (lo, hi) in &self.snapshot.box_bounds {
            writeln!(out, "{lo} {hi}")?;
        }
        writeln!(out, "ITEM: ATOMS id type x y z")?;
        for &i in indices {
            let p = points.point(i);
            writeln!(
                out,
                "{} {} {} {} {}",
                points.id(i),
                points.species(i),
                p[0],
                p.get(1).copied().unwrap_or(0.0),
                p.get(2).copied().unwrap_or(0.0),
            )?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::parse_dump;
    use atomshift_core::{ClusteringParams, HierarchyController};

    fn snapshot() -> DumpSnapshot {
        let mut text = String::from(
            "ITEM: TIMESTEP\n0\nITEM: NUMBER OF ATOMS\n6\nITEM: BOX BOUNDS pp pp pp\n0 200\n0 10\n0 10\nITEM: ATOMS id type x y z\n",
        );
        for (i, x) in [0.0, 0.4, 0.8, 100.0, 100.4, 100.8].iter().enumerate() {
            text.push_str(&format!("{} 1 {} 0.0 0.0\n", i + 1, x));
        }
        parse_dump("inline.dump", &text).unwrap()
    }

    fn run(snapshot: &DumpSnapshot) -> ClusteringResult {
        let params = ClusteringParams {
            input_file: PathBuf::from("inline.dump"),
            output_dir: PathBuf::from("unused"),
            min_atoms: 2,
            max_iterations: 4,
            n_clusters_per_level: None,
            silhouette_threshold: 0.5,
            davies_bouldin_threshold: 1.0,
            dispersion_threshold: None,
            quantile: 0.4,
            limpiar_intermedios: true,
            max_runtime_secs: None,
        };
        HierarchyController::new(params)
            .unwrap()
            .run(&snapshot.points)
            .unwrap()
    }

    #[test]
    fn written_artifacts_are_valid_dumps() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = snapshot();
        let result = run(&snapshot);

        let writer = ArtifactWriter::new(tmp.path(), &snapshot).unwrap();
        let written = writer.write_all(&result).unwrap();
        assert_eq!(written.finals.len(), result.clusters_finales.len());

        for (path, f) in written.finals.iter().zip(&result.clusters_finales) {
            let text = fs::read_to_string(path).unwrap();
            let sub = parse_dump("artifact", &text).unwrap();
            assert_eq!(sub.points.len() as u64, f.record.atoms);
            assert_eq!(sub.timestep, snapshot.timestep);
        }
    }

    #[test]
    fn cleanup_removes_only_intermediates() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = snapshot();
        let result = run(&snapshot);

        let writer = ArtifactWriter::new(tmp.path(), &snapshot).unwrap();
        let written = writer.write_all(&result).unwrap();
        assert!(!written.intermediates.is_empty());

        writer.remove_intermediates(&written).unwrap();
        for path in &written.intermediates {
            assert!(!path.exists());
        }
        for path in &written.finals {
            assert!(path.exists());
        }
    }

    #[test]
    fn summary_carries_the_response() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = snapshot();
        let result = run(&snapshot);
        let response = ClusteringResponse::success(result.records());

        let writer = ArtifactWriter::new(tmp.path(), &snapshot).unwrap();
        let path = writer.write_summary(&response).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["success"], true);
        assert!(value["generated_at"].is_string());
    }
}
