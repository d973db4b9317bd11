//! Conversions between the meshes of this crate and `vtkio` models.
//!
//! Attributes with up to four components are written as `SCALARS`, wider ones as a `FIELD`
//! holding a single array of the same name. When reading, every data array is transferred
//! regardless of its VTK role, keeping its element type and component count.

use crate::algo::merge::Merge;
use crate::attrib::{Attrib, AttribData, AttribDict, Attribute, Location};
use crate::error::{Error, Result};
use crate::mesh::topology::*;
use crate::mesh::{CellType, Mesh, PointCloud, PolyMesh, VertexPositions};

use super::MeshExtractor;
use super::Real;

pub use vtkio::model;
pub use vtkio::model::IOBuffer;

/// The VTK cell type used to store cells of the given type.
pub fn vtk_cell_type(cell_type: CellType) -> model::CellType {
    match cell_type {
        CellType::Vertex => model::CellType::Vertex,
        CellType::Line => model::CellType::Line,
        CellType::Triangle => model::CellType::Triangle,
        CellType::Quad => model::CellType::Quad,
        CellType::Polygon => model::CellType::Polygon,
        CellType::Tetrahedron => model::CellType::Tetra,
        CellType::Pyramid => model::CellType::Pyramid,
        CellType::Wedge => model::CellType::Wedge,
        CellType::Hexahedron => model::CellType::Hexahedron,
    }
}

/// The cell type corresponding to a VTK cell type, if there is one.
pub fn mesh_cell_type(cell_type: model::CellType) -> Option<CellType> {
    Some(match cell_type {
        model::CellType::Vertex => CellType::Vertex,
        model::CellType::Line => CellType::Line,
        model::CellType::Triangle => CellType::Triangle,
        model::CellType::Quad => CellType::Quad,
        model::CellType::Polygon => CellType::Polygon,
        model::CellType::Tetra => CellType::Tetrahedron,
        model::CellType::Pyramid => CellType::Pyramid,
        model::CellType::Wedge => CellType::Wedge,
        model::CellType::Hexahedron => CellType::Hexahedron,
        _ => return None,
    })
}

fn flat_points<T: Real>(positions: &[[T; 3]]) -> Vec<T> {
    positions.iter().flat_map(|x| x.iter().cloned()).collect()
}

/// Legacy vertex numbers for the given cells: each cell is prefixed by its vertex count.
fn legacy_vertex_numbers<'a>(cells: impl ExactSizeIterator<Item = &'a [usize]>) -> model::VertexNumbers {
    let num_cells = cells.len() as u32;
    let mut vertices = Vec::new();
    for cell in cells {
        vertices.push(cell.len() as u32);
        vertices.extend(cell.iter().map(|&vtx| vtx as u32));
    }
    model::VertexNumbers::Legacy {
        num_cells,
        vertices,
    }
}

pub fn convert_mesh_to_vtk_format<T: Real>(mesh: &Mesh<T>) -> model::Vtk {
    model::Vtk {
        version: model::Version::new((0, 1)),
        title: String::from("Unstructured Mesh"),
        byte_order: model::ByteOrder::BigEndian,
        file_path: None,
        data: model::DataSet::inline(model::UnstructuredGridPiece {
            points: IOBuffer::new(flat_points(mesh.vertex_positions())),
            cells: model::Cells {
                cell_verts: legacy_vertex_numbers(mesh.cell_iter()),
                types: mesh.types.iter().map(|&t| vtk_cell_type(t)).collect(),
            },
            data: model::Attributes {
                point: mesh_to_vtk_attribs(&mesh.vertex_attributes),
                cell: mesh_to_vtk_attribs(&mesh.cell_attributes),
            },
        }),
    }
}

pub fn convert_polymesh_to_vtk_format<T: Real>(mesh: &PolyMesh<T>) -> model::Vtk {
    let polys = if mesh.num_faces() > 0 {
        Some(legacy_vertex_numbers(mesh.face_iter()))
    } else {
        None
    };
    model::Vtk {
        version: model::Version::new((0, 1)),
        title: String::from("Polygonal Mesh"),
        byte_order: model::ByteOrder::BigEndian,
        file_path: None,
        data: model::DataSet::inline(model::PolyDataPiece {
            points: IOBuffer::new(flat_points(mesh.vertex_positions())),
            polys,
            data: model::Attributes {
                point: mesh_to_vtk_attribs(&mesh.vertex_attributes),
                cell: mesh_to_vtk_attribs(&mesh.face_attributes),
            },
            ..Default::default()
        }),
    }
}

pub fn convert_pointcloud_to_vtk_format<T: Real>(ptcloud: &PointCloud<T>) -> model::Vtk {
    let num_verts = ptcloud.num_vertices() as u32;
    // A single VERTICES entry containing all points
    let verts = if num_verts > 0 {
        Some(model::VertexNumbers::Legacy {
            num_cells: 1,
            vertices: std::iter::once(num_verts).chain(0..num_verts).collect(),
        })
    } else {
        None
    };
    model::Vtk {
        version: model::Version::new((0, 1)),
        title: String::from("Point Cloud"),
        byte_order: model::ByteOrder::BigEndian,
        file_path: None,
        data: model::DataSet::inline(model::PolyDataPiece {
            points: IOBuffer::new(flat_points(ptcloud.vertex_positions())),
            verts,
            data: model::Attributes {
                point: mesh_to_vtk_attribs(&ptcloud.vertex_attributes),
                cell: Vec::new(),
            },
            ..Default::default()
        }),
    }
}

impl<T: Real> MeshExtractor<T> for model::Vtk {
    /// Constructs an unstructured Mesh from an `UNSTRUCTURED_GRID` model.
    ///
    /// Cells of types without a [`CellType`] counterpart are skipped along with their attribute
    /// values.
    fn extract_mesh(&self) -> Result<Mesh<T>> {
        let model::Vtk {
            file_path, data, ..
        } = &self;
        let pieces = match data {
            model::DataSet::UnstructuredGrid { pieces, .. } => pieces,
            _ => {
                return Err(Error::MalformedData(
                    "expected an unstructured grid".to_owned(),
                ))
            }
        };
        let meshes = pieces
            .iter()
            .map(|piece| -> Result<Mesh<T>> {
                let model::UnstructuredGridPiece {
                    points,
                    cells: model::Cells { cell_verts, types },
                    data,
                } = piece
                    .load_piece_data(file_path.as_ref().map(AsRef::as_ref))
                    .map_err(piece_error)?;
                let pts = read_points(points)?;
                let num_verts = pts.len();

                let (connectivity, offsets) = cell_verts.into_xml();
                if offsets.len() != types.len() {
                    return Err(Error::MalformedData(format!(
                        "{} cells but {} cell types",
                        offsets.len(),
                        types.len()
                    )));
                }

                let mut mesh = Mesh::from_raw_parts(pts, Vec::new(), vec![0], Vec::new());

                // Mapping to original cells, used to transfer cell attributes past skipped cells.
                let mut orig_cell_idx = Vec::with_capacity(types.len());
                let mut cell = Vec::new();
                let mut begin = 0usize;
                for (c, (&end, &vtk_type)) in offsets.iter().zip(types.iter()).enumerate() {
                    let end = end as usize;
                    let vertices = connectivity.get(begin..end).ok_or_else(|| {
                        Error::MalformedData(format!("cell {} has invalid offsets", c))
                    })?;
                    begin = end;

                    cell.clear();
                    cell.extend(vertices.iter().map(|&vtx| vtx as usize));
                    if let Some(&vtx) = cell.iter().find(|&&vtx| vtx >= num_verts) {
                        return Err(Error::MalformedData(format!(
                            "cell {} references vertex {} of {}",
                            c, vtx, num_verts
                        )));
                    }

                    match mesh_cell_type(vtk_type) {
                        Some(cell_type) if cell_type.accepts(cell.len()) => {
                            mesh.push_cell(cell_type, &cell);
                            orig_cell_idx.push(c);
                        }
                        _ => log::warn!(
                            "skipping cell {} of type {:?} with {} vertices",
                            c,
                            vtk_type,
                            cell.len()
                        ),
                    }
                }

                transfer_attribs(data.point, &mut mesh, Location::Vertex, None);
                transfer_attribs(data.cell, &mut mesh, Location::Cell, Some(&orig_cell_idx));
                Ok(mesh)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Mesh::merge_vec(meshes))
    }

    /// Constructs a PolyMesh from a `POLYDATA` model.
    ///
    /// Lines and polygons become faces, vertex cells are ignored and triangle strips are skipped.
    fn extract_polymesh(&self) -> Result<PolyMesh<T>> {
        let model::Vtk {
            file_path, data, ..
        } = &self;
        let pieces = match data {
            model::DataSet::PolyData { pieces, .. } => pieces,
            _ => return Err(Error::MalformedData("expected poly data".to_owned())),
        };
        let meshes = pieces
            .iter()
            .map(|piece| -> Result<PolyMesh<T>> {
                let model::PolyDataPiece {
                    points,
                    verts,
                    lines,
                    polys,
                    strips,
                    data,
                } = piece
                    .load_piece_data(file_path.as_ref().map(AsRef::as_ref))
                    .map_err(piece_error)?;
                let pts = read_points(points)?;

                // Cell data is ordered as vertices, lines, polygons and then strips.
                let mut num_cells = verts.as_ref().map_or(0, |topo| topo.num_cells());
                let mut orig_cell_idx = Vec::new();
                let mut indices = Vec::new();
                let mut offsets = vec![0];

                for topo in [lines, polys].into_iter().flatten() {
                    let (connectivity, cell_offsets) = topo.into_xml();
                    let mut begin = 0usize;
                    for (c, &end) in cell_offsets.iter().enumerate() {
                        let end = end as usize;
                        let face = connectivity.get(begin..end).ok_or_else(|| {
                            Error::MalformedData(format!("face {} has invalid offsets", c))
                        })?;
                        indices.extend(face.iter().map(|&vtx| vtx as usize));
                        offsets.push(indices.len());
                        orig_cell_idx.push(num_cells + c);
                        begin = end;
                    }
                    num_cells += cell_offsets.len();
                }

                if let Some(strips) = strips {
                    log::warn!("skipping {} triangle strips", strips.num_cells());
                }

                if let Some(&vtx) = indices.iter().find(|&&vtx| vtx >= pts.len()) {
                    return Err(Error::MalformedData(format!(
                        "face references vertex {} of {}",
                        vtx,
                        pts.len()
                    )));
                }

                let mut polymesh = PolyMesh::from_raw_parts(pts, indices, offsets);
                transfer_attribs(data.point, &mut polymesh, Location::Vertex, None);
                transfer_attribs(
                    data.cell,
                    &mut polymesh,
                    Location::Cell,
                    Some(&orig_cell_idx),
                );
                Ok(polymesh)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PolyMesh::merge_vec(meshes))
    }

    /// Constructs a PointCloud from all the points of a `POLYDATA` or `UNSTRUCTURED_GRID` model.
    fn extract_pointcloud(&self) -> Result<PointCloud<T>> {
        let model::Vtk {
            file_path, data, ..
        } = &self;
        let file_path = file_path.as_ref().map(AsRef::as_ref);
        let parts: Vec<(IOBuffer, model::Attributes)> = match data {
            model::DataSet::PolyData { pieces, .. } => pieces
                .iter()
                .map(|piece| -> Result<(IOBuffer, model::Attributes)> {
                    let piece = piece.load_piece_data(file_path).map_err(piece_error)?;
                    Ok((piece.points, piece.data))
                })
                .collect::<Result<_>>()?,
            model::DataSet::UnstructuredGrid { pieces, .. } => pieces
                .iter()
                .map(|piece| -> Result<(IOBuffer, model::Attributes)> {
                    let piece = piece.load_piece_data(file_path).map_err(piece_error)?;
                    Ok((piece.points, piece.data))
                })
                .collect::<Result<_>>()?,
            _ => {
                return Err(Error::MalformedData(
                    "expected poly data or an unstructured grid".to_owned(),
                ))
            }
        };

        let ptclouds = parts
            .into_iter()
            .map(|(points, data)| -> Result<PointCloud<T>> {
                let mut ptcloud = PointCloud::new(read_points(points)?);
                transfer_attribs(data.point, &mut ptcloud, Location::Vertex, None);
                Ok(ptcloud)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PointCloud::merge_vec(ptclouds))
    }
}

fn piece_error(err: model::Error) -> Error {
    Error::MalformedData(format!("failed to load piece data: {:?}", err))
}

fn read_points<T: Real>(points: IOBuffer) -> Result<Vec<[T; 3]>> {
    let coords: Vec<T> = points.cast_into().ok_or_else(|| {
        Error::MalformedData("point coordinates cannot be represented".to_owned())
    })?;
    if coords.len() % 3 != 0 {
        return Err(Error::MalformedData(format!(
            "{} point coordinates do not form 3D points",
            coords.len()
        )));
    }
    Ok(coords
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

fn attrib_data_to_buffer(data: &AttribData) -> IOBuffer {
    match data.clone() {
        AttribData::I8(v) => IOBuffer::I8(v),
        AttribData::U8(v) => IOBuffer::U8(v),
        AttribData::I16(v) => IOBuffer::I16(v),
        AttribData::U16(v) => IOBuffer::U16(v),
        AttribData::I32(v) => IOBuffer::I32(v),
        AttribData::U32(v) => IOBuffer::U32(v),
        AttribData::I64(v) => IOBuffer::I64(v),
        AttribData::U64(v) => IOBuffer::U64(v),
        AttribData::F32(v) => IOBuffer::F32(v),
        AttribData::F64(v) => IOBuffer::F64(v),
    }
}

fn buffer_to_attrib_data(buf: IOBuffer) -> Option<AttribData> {
    Some(match buf {
        IOBuffer::I8(v) => AttribData::I8(v),
        IOBuffer::U8(v) => AttribData::U8(v),
        IOBuffer::I16(v) => AttribData::I16(v),
        IOBuffer::U16(v) => AttribData::U16(v),
        IOBuffer::I32(v) => AttribData::I32(v),
        IOBuffer::U32(v) => AttribData::U32(v),
        IOBuffer::I64(v) => AttribData::I64(v),
        IOBuffer::U64(v) => AttribData::U64(v),
        IOBuffer::F32(v) => AttribData::F32(v),
        IOBuffer::F64(v) => AttribData::F64(v),
        IOBuffer::Bit(_) => return None,
    })
}

/// Convert all attributes in `dict` to VTK attributes, ordered by name.
fn mesh_to_vtk_attribs(dict: &AttribDict) -> Vec<model::Attribute> {
    let mut attribs: Vec<_> = dict.iter().collect();
    attribs.sort_by(|a, b| a.0.cmp(b.0));
    attribs
        .into_iter()
        .map(|(name, attrib)| mesh_to_vtk_attrib(name, attrib))
        .collect()
}

/// Escape whitespace and `%` as `%XX` byte sequences.
///
/// Legacy VTK headers delimit names by whitespace.
fn encode_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '%' || c.is_whitespace() {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                encoded.push_str(&format!("%{:02X}", byte));
            }
        } else {
            encoded.push(c);
        }
    }
    encoded
}

/// Inverse of `encode_name`. Names that do not decode to valid UTF-8 are kept as is.
fn decode_name(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escaped = bytes
                .get(i + 1..i + 3)
                .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = escaped {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(decoded).unwrap_or_else(|_| name.to_owned())
}

fn mesh_to_vtk_attrib(name: &str, attrib: &Attribute) -> model::Attribute {
    let name = encode_name(name);
    let data = attrib_data_to_buffer(attrib.data());
    let num_comp = attrib.num_comp() as u32;
    if num_comp <= 4 {
        model::Attribute::scalars(name, num_comp).with_data(data)
    } else {
        // Legacy SCALARS are limited to four components.
        model::Attribute::field(name.clone())
            .with_field_data(vec![model::FieldArray::new(name, num_comp).with_data(data)])
    }
}

/// Flatten VTK attributes into named attributes. Arrays that cannot be represented are skipped.
fn vtk_to_mesh_attribs(attribs: Vec<model::Attribute>) -> Vec<(String, Attribute)> {
    let mut arrays = Vec::with_capacity(attribs.len());
    for attrib in attribs {
        match attrib {
            model::Attribute::DataArray(model::DataArray { name, elem, data }) => {
                let num_comp = match elem {
                    model::ElementType::Scalars { num_comp, .. }
                    | model::ElementType::TCoords(num_comp)
                    | model::ElementType::Generic(num_comp) => num_comp as usize,
                    model::ElementType::Vectors | model::ElementType::Normals => 3,
                    model::ElementType::Tensors => 9,
                    _ => {
                        log::warn!("skipping attribute '{}' with element type {:?}", name, elem);
                        continue;
                    }
                };
                arrays.push((decode_name(&name), data, num_comp));
            }
            model::Attribute::Field { data_array, .. } => {
                for model::FieldArray { name, elem, data } in data_array {
                    arrays.push((decode_name(&name), data, elem as usize));
                }
            }
        }
    }

    arrays
        .into_iter()
        .filter_map(|(name, data, num_comp)| {
            let attrib = buffer_to_attrib_data(data)
                .ok_or_else(|| Error::MalformedData("bit arrays are not supported".to_owned()))
                .and_then(|data| Attribute::new(data, num_comp));
            match attrib {
                Ok(attrib) => Some((name, attrib)),
                Err(err) => {
                    log::warn!("skipping attribute '{}': {}", name, err);
                    None
                }
            }
        })
        .collect()
}

/// Adds VTK attributes to the given mesh at `loc`.
///
/// `orig_map` gives the index of the original VTK element for each element of the mesh. Transfer
/// failures are logged and do not stop the remaining attributes from being transferred.
fn transfer_attribs<M: Attrib>(
    attribs: Vec<model::Attribute>,
    mesh: &mut M,
    loc: Location,
    orig_map: Option<&[usize]>,
) {
    for (name, attrib) in vtk_to_mesh_attribs(attribs) {
        let attrib = match orig_map {
            Some(map) if map.iter().any(|&i| i >= attrib.len()) => {
                log::warn!(
                    "skipping attribute '{}' with {} values for {} elements",
                    name,
                    attrib.len(),
                    map.len()
                );
                continue;
            }
            Some(map) => attrib.select(map),
            None => attrib,
        };
        if let Err(err) = mesh.add_attrib(loc, &name, attrib) {
            log::warn!("attribute transfer error for '{}': {}", name, err);
        }
    }
}
