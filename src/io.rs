//! IO module for multi-block containers.
//!
//! A [`MultiBlock`] is persisted as a manifest file plus one legacy VTK file per dataset block.
//!
//! Supported manifest formats:
//!  - `json` via [`serde_json`](https://crates.io/crates/serde_json).
//!  - `ron` via [`ron`](https://crates.io/crates/ron).
//!
//! Block files are written with [`vtkio`](https://crates.io/crates/vtkio) into a directory next to
//! the manifest named after the manifest's file stem. Saving `scene.json` produces
//!
//! ```text
//! scene.json
//! scene/block_0.vtk
//! scene/block_2_0.vtk   (first block of a container nested at index 2)
//! ```
//!
//! Point clouds and polygon meshes are stored as `POLYDATA` and unstructured meshes as
//! `UNSTRUCTURED_GRID`. Empty blocks, names and nesting live in the manifest only. Saving
//! replaces any `block_*.vtk` files already in the block directory.
//!
//! Attribute names are stored with whitespace and `%` escaped as `%XX`, since legacy VTK headers
//! cannot hold whitespace in names.
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
pub use vtkio::Vtk;

use crate::dataset::{DataSetView, SharedDataSet};
use crate::error::{Error, Result};
use crate::mesh::{Mesh, PointCloud, PolyMesh};
use crate::multiblock::MultiBlock;

pub mod vtk;

/// Floating point type that can be read from and written to VTK files.
pub trait Real: vtkio::model::Scalar + std::str::FromStr + crate::Real {}
impl<T> Real for T where T: vtkio::model::Scalar + std::str::FromStr + crate::Real {}

/// Version written to new manifests. Manifests with a newer version are rejected.
pub const MANIFEST_VERSION: u32 = 1;

/// A trait for file specific models to extract mesh data from.
///
/// All methods are optional and default implementations simply return a `MalformedData` error.
pub trait MeshExtractor<T: crate::Real> {
    /// Constructs an unstructured Mesh from this model.
    fn extract_mesh(&self) -> Result<Mesh<T>> {
        Err(Error::MalformedData(
            "model does not contain an unstructured mesh".to_owned(),
        ))
    }
    /// Constructs a PolyMesh from this model.
    fn extract_polymesh(&self) -> Result<PolyMesh<T>> {
        Err(Error::MalformedData(
            "model does not contain a polygon mesh".to_owned(),
        ))
    }
    /// Constructs a PointCloud from this model.
    fn extract_pointcloud(&self) -> Result<PointCloud<T>> {
        Err(Error::MalformedData(
            "model does not contain a point cloud".to_owned(),
        ))
    }
}

/// Layout of a saved container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub blocks: Vec<BlockEntry>,
}

/// A single block of a [`Manifest`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: BlockContent,
}

/// What a block holds. File paths are relative to the manifest's directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BlockContent {
    Empty,
    PointCloud { file: String },
    PolyMesh { file: String },
    Mesh { file: String },
    MultiBlock { blocks: Vec<BlockEntry> },
}

/// Serialization format of a manifest, determined by the file extension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Ron,
}

impl ManifestFormat {
    /// Determine the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(ManifestFormat::Json),
            Some("ron") => Ok(ManifestFormat::Ron),
            Some(ext) => Err(Error::UnsupportedFormat(format!(".{}", ext))),
            None => Err(Error::UnsupportedFormat(format!(
                "{} has no extension",
                path.display()
            ))),
        }
    }

    fn serialize(self, manifest: &Manifest) -> Result<String> {
        match self {
            ManifestFormat::Json => serde_json::to_string_pretty(manifest)
                .map_err(|err| Error::Io(std::io::Error::other(err))),
            ManifestFormat::Ron => {
                ron::ser::to_string_pretty(manifest, ron::ser::PrettyConfig::default())
                    .map_err(|err| Error::Io(std::io::Error::other(err)))
            }
        }
    }

    fn deserialize(self, text: &str) -> Result<Manifest> {
        match self {
            ManifestFormat::Json => {
                serde_json::from_str(text).map_err(|err| Error::MalformedData(err.to_string()))
            }
            ManifestFormat::Ron => {
                ron::from_str(text).map_err(|err| Error::MalformedData(err.to_string()))
            }
        }
    }
}

/// Encoding of the VTK block files.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Encoding {
    Binary,
    Ascii,
}

impl<T: Real> MultiBlock<T> {
    /// Save this container to a `json` or `ron` manifest with binary VTK block files.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_multiblock(self, path)
    }

    /// Save this container to a `json` or `ron` manifest with ASCII VTK block files.
    pub fn save_ascii(&self, path: impl AsRef<Path>) -> Result<()> {
        save_multiblock_ascii(self, path)
    }

    /// Load a container from a manifest written by [`MultiBlock::save`] or
    /// [`MultiBlock::save_ascii`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_multiblock(path)
    }
}

/*
 * IO calls for multi-block containers
 */

/// Save a multi-block container to a manifest file with binary VTK block files.
pub fn save_multiblock<T: Real, P: AsRef<Path>>(multi: &MultiBlock<T>, file: P) -> Result<()> {
    save_multiblock_impl(multi, file.as_ref(), Encoding::Binary)
}

/// Save a multi-block container to a manifest file with ASCII VTK block files.
pub fn save_multiblock_ascii<T: Real, P: AsRef<Path>>(
    multi: &MultiBlock<T>,
    file: P,
) -> Result<()> {
    save_multiblock_impl(multi, file.as_ref(), Encoding::Ascii)
}

fn save_multiblock_impl<T: Real>(
    multi: &MultiBlock<T>,
    file: &Path,
    encoding: Encoding,
) -> Result<()> {
    let format = ManifestFormat::from_path(file)?;
    let stem = file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::UnsupportedFormat(format!("{}", file.display())))?;
    let base = file.parent().unwrap_or_else(|| Path::new(""));
    let block_dir = base.join(stem);
    std::fs::create_dir_all(&block_dir)?;
    remove_stale_blocks(&block_dir)?;

    let manifest = Manifest {
        version: MANIFEST_VERSION,
        blocks: write_blocks(multi, base, stem, "block", encoding)?,
    };
    std::fs::write(file, format.serialize(&manifest)?)?;
    log::debug!(
        "saved {} blocks to {}",
        multi.num_blocks(),
        file.display()
    );
    Ok(())
}

/// Remove block files left behind by an earlier save into the same directory.
fn remove_stale_blocks(dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_block = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with("block_") && name.ends_with(".vtk"));
        if is_block && path.is_file() {
            log::trace!("removing stale block file {}", path.display());
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Write every dataset of `multi` into `base/dir` and return the matching manifest entries.
fn write_blocks<T: Real>(
    multi: &MultiBlock<T>,
    base: &Path,
    dir: &str,
    prefix: &str,
    encoding: Encoding,
) -> Result<Vec<BlockEntry>> {
    let mut entries = Vec::with_capacity(multi.num_blocks());
    for (i, (name, data)) in multi.iter_named().enumerate() {
        let block_stem = format!("{}_{}", prefix, i);
        let file = format!("{}/{}.vtk", dir, block_stem);
        let content = match data {
            None => BlockContent::Empty,
            Some(data) => match data.view() {
                DataSetView::PointCloud(ptcloud) => {
                    let vtk = vtk::convert_pointcloud_to_vtk_format(ptcloud);
                    write_vtk(vtk, base, &file, encoding)?;
                    BlockContent::PointCloud { file }
                }
                DataSetView::PolyMesh(polymesh) => {
                    let vtk = vtk::convert_polymesh_to_vtk_format(polymesh);
                    write_vtk(vtk, base, &file, encoding)?;
                    BlockContent::PolyMesh { file }
                }
                DataSetView::Mesh(mesh) => {
                    write_vtk(vtk::convert_mesh_to_vtk_format(mesh), base, &file, encoding)?;
                    BlockContent::Mesh { file }
                }
                DataSetView::MultiBlock(nested) => BlockContent::MultiBlock {
                    blocks: write_blocks(nested, base, dir, &block_stem, encoding)?,
                },
                DataSetView::Other => return Err(Error::UnsupportedDataSet(data.type_name())),
            },
        };
        entries.push(BlockEntry {
            name: name.map(String::from),
            content,
        });
    }
    Ok(entries)
}

fn write_vtk(vtk: Vtk, base: &Path, file: &str, encoding: Encoding) -> Result<()> {
    let path = base.join(file);
    log::trace!("writing block file {}", path.display());
    match encoding {
        Encoding::Binary => vtk.export_be(&path)?,
        Encoding::Ascii => vtk.export_ascii(&path)?,
    }
    Ok(())
}

/// Load a multi-block container from a manifest file.
pub fn load_multiblock<T: Real, P: AsRef<Path>>(file: P) -> Result<MultiBlock<T>> {
    load_multiblock_impl(file.as_ref())
}

fn load_multiblock_impl<T: Real>(file: &Path) -> Result<MultiBlock<T>> {
    let format = ManifestFormat::from_path(file)?;
    if !file.is_file() {
        return Err(Error::FileNotFound(file.to_path_buf()));
    }
    let manifest = format.deserialize(&std::fs::read_to_string(file)?)?;
    if manifest.version > MANIFEST_VERSION {
        return Err(Error::MalformedData(format!(
            "manifest version {} is newer than the supported version {}",
            manifest.version, MANIFEST_VERSION
        )));
    }
    let base = file.parent().unwrap_or_else(|| Path::new(""));
    let multi = read_blocks(&manifest.blocks, base)?;
    log::debug!("loaded {} blocks from {}", multi.num_blocks(), file.display());
    Ok(multi)
}

fn read_blocks<T: Real>(entries: &[BlockEntry], base: &Path) -> Result<MultiBlock<T>> {
    let mut multi = MultiBlock::new();
    for entry in entries {
        let data: Option<SharedDataSet<T>> = match &entry.content {
            BlockContent::Empty => None,
            BlockContent::PointCloud { file } => {
                let ptcloud: PointCloud<T> = read_vtk(base, file)?.extract_pointcloud()?;
                Some(Arc::new(ptcloud))
            }
            BlockContent::PolyMesh { file } => {
                let polymesh: PolyMesh<T> = read_vtk(base, file)?.extract_polymesh()?;
                Some(Arc::new(polymesh))
            }
            BlockContent::Mesh { file } => {
                let mesh: Mesh<T> = read_vtk(base, file)?.extract_mesh()?;
                Some(Arc::new(mesh))
            }
            BlockContent::MultiBlock { blocks } => Some(Arc::new(read_blocks::<T>(blocks, base)?)),
        };
        match &entry.name {
            Some(name) => multi.append_with_name(data, name),
            None => multi.append(data),
        };
    }
    Ok(multi)
}

fn read_vtk(base: &Path, file: &str) -> Result<Vtk> {
    let path = base.join(file);
    if !path.is_file() {
        return Err(Error::FileNotFound(path));
    }
    log::trace!("reading block file {}", path.display());
    Vtk::import(&path).map_err(|err| Error::MalformedData(format!("{}: {}", path.display(), err)))
}
