/// STL parser for binary and ASCII formats
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0, many1},
    number::complete::{float, le_f32, le_u32},
    sequence::{preceded, tuple},
    IResult,
};
use tracing::debug;

use crate::error::DecodeError;
use crate::format::ModelFormat;
use crate::geometry::{Mesh, Triangle, Vertex};
use crate::scene::{DecodedAsset, Material, ModelMesh, SceneNode};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Decode STL bytes into a single shadow-casting mesh with the default
/// STL material, since the format carries none.
pub fn decode(data: &[u8]) -> Result<DecodedAsset, DecodeError> {
    let mesh = parse_stl(data)?;
    debug!(triangles = mesh.triangles.len(), "decoded STL");

    let root = SceneNode::new(None)
        .with_mesh(ModelMesh::new(mesh, Material::stl_default()).with_shadows());
    Ok(DecodedAsset::new(ModelFormat::Stl, root))
}

/// Detect and parse STL data (ASCII first when it looks like text)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, DecodeError> {
    let trimmed = data.trim_ascii_start();
    if trimmed.starts_with(b"solid") {
        // Plenty of binary exporters also start their header with "solid"
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, DecodeError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(DecodeError::Stl("file too small to be a valid STL".to_string()));
    }

    let declared = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let available = (data.len() - HEADER_LEN - 4) / FACET_LEN;
    if available < declared {
        return Err(DecodeError::Stl(format!(
            "truncated: header declares {declared} triangles, data holds {available}"
        )));
    }

    match binary_body(data) {
        Ok((_, triangles)) => Ok(into_mesh(triangles)),
        Err(e) => Err(DecodeError::Stl(format!("{e:?}"))),
    }
}

/// Parse an ASCII STL file, possibly holding several solids
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, DecodeError> {
    match many1(ascii_solid)(input) {
        Ok((rest, solids)) if rest.trim().is_empty() => {
            Ok(into_mesh(solids.into_iter().flatten().collect()))
        }
        Ok((rest, _)) => Err(DecodeError::Stl(format!(
            "unexpected trailing content near {:?}",
            rest.chars().take(32).collect::<String>()
        ))),
        Err(e) => Err(DecodeError::Stl(format!("failed to parse ASCII STL: {e:?}"))),
    }
}

fn into_mesh(triangles: Vec<Triangle>) -> Mesh {
    let mut mesh = Mesh::with_capacity(triangles.len());
    for mut triangle in triangles {
        // Exporters often leave the stored normal zeroed
        if triangle.vertices[0].normal.norm_squared() < f32::EPSILON {
            let normal = triangle.calculate_normal();
            for vertex in &mut triangle.vertices {
                vertex.normal = normal;
            }
        }
        mesh.add_triangle(triangle);
    }
    mesh
}

fn binary_body(input: &[u8]) -> IResult<&[u8], Vec<Triangle>> {
    let (input, _) = take(HEADER_LEN)(input)?;
    let (input, n) = le_u32(input)?;
    count(binary_facet, n as usize)(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = le_vector3(input)?;
    let (input, (a, b, c)) = tuple((le_vector3, le_vector3, le_vector3))(input)?;
    // Attribute byte count, unused
    let (input, _) = take(2usize)(input)?;

    let vertex = |p: [f32; 3]| Vertex::from_arrays(p, normal);
    Ok((input, Triangle::new(vertex(a), vertex(b), vertex(c))))
}

fn le_vector3(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<Triangle>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, triangles))
}

fn ascii_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = ascii_vertex(input, normal)?;
    let (input, v2) = ascii_vertex(input, normal)?;
    let (input, v3) = ascii_vertex(input, normal)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v1, v2, v3)))
}

fn ascii_vertex(input: &str, normal: [f32; 3]) -> IResult<&str, Vertex> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, position) = ascii_vector3(input)?;
    Ok((input, Vertex::from_arrays(position, normal)))
}

fn ascii_vector3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, x) = preceded(multispace1, float)(input)?;
    let (input, y) = preceded(multispace1, float)(input)?;
    let (input, z) = preceded(multispace1, float)(input)?;
    Ok((input, [x, y, z]))
}
