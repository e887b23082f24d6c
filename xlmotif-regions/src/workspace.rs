//! Per-run working state.
//!
//! A [`RunContext`] owns the temporary directory intermediate files are
//! written to, together with the partitioned segmentation and the chromosome
//! sizes the run analyses. The directory is removed when the context is
//! dropped, whether the run succeeds or fails.
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use xlmotif_core::models::ChromSizes;

use crate::errors::Result;
use crate::region_index::{Partition, PartitionName, RegionIndex};

pub const WORKSPACE_PREFIX: &str = "xlmotif-";

pub struct RunContext {
    workspace: TempDir,
    pub chrom_sizes: ChromSizes,
    pub region_index: RegionIndex,
    partition_files: Vec<PathBuf>,
}

impl RunContext {
    ///
    /// Create the run workspace, persist the partitions and the chromosome
    /// sizes into it.
    pub fn new(region_index: RegionIndex, chrom_sizes: ChromSizes) -> Result<Self> {
        let workspace = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()?;

        let partition_files = region_index.persist(workspace.path())?;
        chrom_sizes.to_file(workspace.path().join("genome.sizes"))?;

        log::debug!("Run workspace created at {}", workspace.path().display());

        Ok(RunContext {
            workspace,
            chrom_sizes,
            region_index,
            partition_files,
        })
    }

    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    pub fn partition(&self, name: PartitionName) -> &Partition {
        self.region_index.partition(name)
    }

    /// Persisted partition files, in [`PartitionName::ALL`] order.
    pub fn partition_files(&self) -> &[PathBuf] {
        &self.partition_files
    }

    pub fn sizes_file(&self) -> PathBuf {
        self.workspace.path().join("genome.sizes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use xlmotif_core::models::{RegionKind, Strand};

    use crate::region_index::Region;

    fn make_context() -> RunContext {
        let region = Region {
            chrom: "chr1".to_string(),
            source: ".".to_string(),
            kind: RegionKind::Intergenic,
            start: 0,
            end: 500,
            strand: Strand::Plus,
            attributes: "gene_id \".\";".to_string(),
            trimmed: false,
        };
        RunContext::new(
            RegionIndex::from_regions(vec![region]),
            ChromSizes::from(vec![("chr1".to_string(), 1000)]),
        )
        .unwrap()
    }

    #[rstest]
    fn test_workspace_contents() {
        let ctx = make_context();
        assert!(ctx.sizes_file().exists());
        assert_eq!(ctx.partition_files().len(), 3);
        assert!(ctx.partition_files().iter().all(|path| path.exists()));
        assert_eq!(ctx.partition(PartitionName::Intergenic).len(), 1);
        let name = ctx.workspace().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(WORKSPACE_PREFIX));
    }

    #[rstest]
    fn test_workspace_removed_on_drop() {
        let ctx = make_context();
        let dir = ctx.workspace().to_path_buf();
        assert!(dir.exists());
        drop(ctx);
        assert!(!dir.exists());
    }
}
